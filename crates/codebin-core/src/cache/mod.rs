//! Cache management module

mod manager;

pub use manager::{CacheConfig, CacheStats, TtlCache, spawn_cleanup_task};
