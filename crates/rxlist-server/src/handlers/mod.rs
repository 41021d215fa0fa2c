//! Route handlers, grouped by resource.

mod drugs;
mod medications;

pub use drugs::search_drugs;
pub use medications::{add_medication, list_medications, remove_medication};

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
