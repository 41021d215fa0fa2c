//! Result caching for terminology lookups.
//!
//! - [`CacheBackend`] - namespaced key/value storage with per-entry TTL
//! - [`MemoryCache`] - process-local backend
//! - [`SqliteCache`] - backend shared by every process using the database
//! - [`ResultCache`] - typed `get_or_compute` on top of any backend

mod memory;
mod result_cache;
mod sqlite;
mod traits;

pub use memory::MemoryCache;
pub use result_cache::{CacheKey, ResultCache};
pub use sqlite::SqliteCache;
pub use traits::{CacheBackend, CacheEntry};
