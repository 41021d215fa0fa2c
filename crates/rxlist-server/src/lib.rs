//! RxList HTTP surface.
//!
//! Routes:
//! - `GET /health`
//! - `GET /drugs/search?drug_name=` (public, rate limited per client address)
//! - `GET|POST|DELETE /medications` (bearer token)

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod validation;

pub use auth::{AuthUser, TokenRegistry};
pub use error::ApiError;
pub use server::{build_router, spawn_expiry_sweep, start_server, AppState};
