//! Store capability traits
//!
//! The cache and account layers only need a narrow view of the store of
//! record. "Not found" is signalled by `Ok(None)` so that it can never be
//! confused with a store failure.

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{NewSnippet, NewUser, Snippet, User};
use crate::repository::Database;

/// Snippet persistence
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Fetch an unexpired snippet by ID
    async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>, DbError>;

    /// Persist a snippet and return its new ID
    async fn insert_snippet(&self, snippet: NewSnippet) -> Result<String, DbError>;

    /// Most recent unexpired snippets, newest first
    async fn latest_snippets(&self, limit: u32) -> Result<Vec<Snippet>, DbError>;
}

/// User credential persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Persist a user; fails with [`DbError::Duplicate`] if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError>;
}

#[async_trait]
impl SnippetStore for Database {
    async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>, DbError> {
        Database::get_snippet(self, id).await
    }

    async fn insert_snippet(&self, snippet: NewSnippet) -> Result<String, DbError> {
        Database::insert_snippet(self, snippet).await
    }

    async fn latest_snippets(&self, limit: u32) -> Result<Vec<Snippet>, DbError> {
        Database::latest_snippets(self, limit).await
    }
}

#[async_trait]
impl UserStore for Database {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Database::get_user_by_email(self, email).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        Database::insert_user(self, user).await
    }
}
