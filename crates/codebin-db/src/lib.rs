//! Codebin Database Layer
//!
//! This crate provides the store-of-record for Codebin: snippets and user
//! credentials kept in SQLite via sqlx, plus the capability traits the
//! upper layers depend on.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
pub use store::{SnippetStore, UserStore};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
