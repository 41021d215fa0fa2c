//! Fixed-window rate limiting.
//!
//! - [`RateLimitStore`] - counters keyed by string, each with its own window
//! - [`MemoryRateLimitStore`] - process-local store
//! - [`SqliteRateLimitStore`] - store shared by every process using the database
//! - [`RateLimiter`] - per-subject policy on top of a store

mod limiter;
mod memory;
mod sqlite;
mod store;

pub use limiter::{RateDecision, RateLimiter};
pub use memory::MemoryRateLimitStore;
pub use sqlite::SqliteRateLimitStore;
pub use store::RateLimitStore;
