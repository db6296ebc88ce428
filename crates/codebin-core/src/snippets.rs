//! Read-through snippet service

use codebin_db::{NewSnippet, Snippet, SnippetStore};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::error::CoreError;

/// Number of snippets returned by [`SnippetService::latest_snippets`]
pub const LATEST_SNIPPETS_LIMIT: u32 = 10;

/// Maximum allowed title length in characters
const MAX_TITLE_LENGTH: usize = 100;
/// Maximum allowed content length in bytes
const MAX_CONTENT_LENGTH: usize = 64 * 1024;

/// Snippet reads and writes, with reads served from the cache when fresh
pub struct SnippetService {
    store: Arc<dyn SnippetStore>,
    cache: Arc<TtlCache<Snippet>>,
}

impl SnippetService {
    pub fn new(store: Arc<dyn SnippetStore>, cache: Arc<TtlCache<Snippet>>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<TtlCache<Snippet>> {
        &self.cache
    }

    /// Get a snippet by ID
    ///
    /// The cache is only populated after the store read completes, so a
    /// request cancelled mid-fetch leaves the cache untouched.
    pub async fn get_snippet(&self, id: &str) -> Result<Snippet, CoreError> {
        let now = self.cache.now();
        if let Some(snippet) = self.cache.get_if(id, |snippet| !snippet.is_expired(now)) {
            debug!("Cache hit for snippet: {}", id);
            metrics::counter!("codebin_cache_hits_total").increment(1);
            return Ok(snippet);
        }

        debug!("Cache miss for snippet: {}", id);
        metrics::counter!("codebin_cache_misses_total").increment(1);

        let snippet = self
            .store
            .get_snippet(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("snippet '{}'", id)))?;

        self.cache.insert(id.to_string(), snippet.clone());
        Ok(snippet)
    }

    /// Create a snippet and return the stored record
    pub async fn create_snippet(&self, title: &str, content: &str) -> Result<Snippet, CoreError> {
        validate_snippet(title, content)?;

        let id = self
            .store
            .insert_snippet(NewSnippet {
                title: title.to_string(),
                content: content.to_string(),
            })
            .await?;

        // Never let a stale copy shadow the new record
        self.cache.invalidate(&id);

        info!("Created snippet {}", id);

        self.store
            .get_snippet(&id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("snippet '{}'", id)))
    }

    /// Most recent snippets, straight from the store
    pub async fn latest_snippets(&self) -> Result<Vec<Snippet>, CoreError> {
        Ok(self.store.latest_snippets(LATEST_SNIPPETS_LIMIT).await?)
    }
}

fn validate_snippet(title: &str, content: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("title must be provided".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "title must not be more than {} characters long",
            MAX_TITLE_LENGTH
        )));
    }
    if content.trim().is_empty() {
        return Err(CoreError::Validation("content must be provided".to_string()));
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "content must not be more than {} bytes long",
            MAX_CONTENT_LENGTH
        )));
    }
    Ok(())
}
