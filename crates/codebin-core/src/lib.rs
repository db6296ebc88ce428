//! Codebin Core Business Logic
//!
//! This crate provides the in-process snippet cache, its expiry sweep,
//! and the read-through snippet service that sits in front of the store.

pub mod cache;
pub mod clock;
pub mod error;
pub mod snippets;

pub use cache::{CacheConfig, CacheStats, TtlCache, spawn_cleanup_task};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use snippets::{LATEST_SNIPPETS_LIMIT, SnippetService};
