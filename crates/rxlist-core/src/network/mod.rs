//! Outbound HTTP plumbing.
//!
//! A thin wrapper around reqwest that fixes the timeout and user agent and
//! turns transport failures into [`RxListError`](crate::RxListError)s.

mod client;

pub use client::{extract_domain, HttpClient};
