//! Codebin REST API
//!
//! This crate provides the Axum-based HTTP API for Codebin: snippet
//! reads and writes, registration, and token issuance.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
