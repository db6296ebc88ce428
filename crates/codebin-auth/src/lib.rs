//! Codebin Authentication
//!
//! This crate provides password hashing, stateless JWT session tokens,
//! the bearer-token request gate, and the login/registration flows built
//! on top of them.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{AuthUser, auth_middleware, authenticate, extract_bearer_token};
pub use password::{hash_password, verify_password};
pub use service::AuthService;
