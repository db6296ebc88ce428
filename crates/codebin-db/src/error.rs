//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Map a unique-constraint violation onto [`DbError::Duplicate`]
    pub(crate) fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        let unique = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        if unique {
            DbError::Duplicate(what.into())
        } else {
            DbError::Connection(err)
        }
    }
}
