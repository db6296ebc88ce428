//! Snippet operations

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewSnippet, SNIPPET_LIFETIME_DAYS, Snippet};
use crate::repository::Database;
use crate::utils::format_datetime;

impl Database {
    /// Insert a new snippet, returning its generated ID
    pub async fn insert_snippet(&self, snippet: NewSnippet) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::days(SNIPPET_LIFETIME_DAYS);

        sqlx::query(
            r#"
            INSERT INTO snippets (id, title, content, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&snippet.title)
        .bind(&snippet.content)
        .bind(format_datetime(now))
        .bind(format_datetime(expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, format!("Snippet '{}' already exists", id)))?;

        Ok(id)
    }

    /// Get an unexpired snippet by ID
    pub async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, content, created_at, expires_at
            FROM snippets
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(id)
        .bind(format_datetime(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Snippet::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List the most recently created unexpired snippets
    pub async fn latest_snippets(&self, limit: u32) -> Result<Vec<Snippet>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, created_at, expires_at
            FROM snippets
            WHERE expires_at > ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(format_datetime(Utc::now()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Snippet::try_from(row).map_err(DbError::from))
            .collect()
    }
}
