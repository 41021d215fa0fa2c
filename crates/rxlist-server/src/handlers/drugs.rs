//! Public drug search.

use crate::error::ApiError;
use crate::server::AppState;
use crate::validation;
use axum::extract::{ConnectInfo, Query, State};
use axum::Json;
use rxlist_core::config::SearchConfig;
use rxlist_core::{DrugRecord, RateDecision, RxListError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    drug_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    data: Vec<DrugRecord>,
}

/// `GET /drugs/search?drug_name=`
///
/// Validation runs before the rate limit, so malformed requests are not
/// counted against the caller.
pub async fn search_drugs(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let name = validation::drug_name(params.drug_name.as_deref())?;

    let subject = peer.ip().to_string();
    if let RateDecision::Limited { retry_after } = state.search_limiter.attempt(&subject)? {
        return Err(RxListError::RateLimited {
            subject,
            retry_after_secs: Some(retry_after.as_secs_f64().ceil() as u64),
        }
        .into());
    }

    let data = state
        .drugs
        .search(name, SearchConfig::DEFAULT_LIMIT)
        .await
        .map_err(ApiError::Search)?;

    debug!("Search '{}' from {} returned {} drugs", name, subject, data.len());
    Ok(Json(SearchResponse { data }))
}
