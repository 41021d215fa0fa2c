//! Mapping of core errors onto HTTP responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rxlist_core::RxListError;
use serde_json::json;
use tracing::error;

pub const SEARCH_FAILED: &str = "Error searching for drugs. Please try again.";
pub const TOO_MANY_SEARCHES: &str = "Too many search requests. Please try again later.";
pub const ALREADY_LISTED: &str = "This medication is already in your list.";
pub const INVALID_RXCUI: &str = "Invalid RxCUI provided.";
pub const DETAILS_UNAVAILABLE: &str = "Could not retrieve drug information.";
pub const NOT_LISTED: &str = "Medication not found in your list.";
pub const UNAUTHENTICATED: &str = "Unauthenticated.";
pub const SERVER_ERROR: &str = "Server Error";

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// The drug search itself failed; the cause is echoed to the client.
    Search(RxListError),
    Core(RxListError),
}

impl From<RxListError> for ApiError {
    fn from(err: RxListError) -> Self {
        ApiError::Core(err)
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Search(err) => {
                error!("Drug search failed: {}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": SEARCH_FAILED,
                        "error": err.to_string(),
                    })),
                )
                    .into_response();
            }
            ApiError::Core(err) => err,
        };

        match err {
            RxListError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": message,
                    "errors": { field: [message] },
                })),
            )
                .into_response(),
            RxListError::Unauthenticated => self::message(StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
            RxListError::RateLimited {
                retry_after_secs, ..
            } => {
                let mut response = self::message(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_SEARCHES);
                if let Some(secs) = retry_after_secs {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            RxListError::Conflict { .. } => self::message(StatusCode::BAD_REQUEST, ALREADY_LISTED),
            RxListError::InvalidRxcui { .. } => self::message(StatusCode::BAD_REQUEST, INVALID_RXCUI),
            RxListError::DrugDetailsUnavailable { .. } => {
                self::message(StatusCode::BAD_REQUEST, DETAILS_UNAVAILABLE)
            }
            RxListError::NotFound { .. } => self::message(StatusCode::NOT_FOUND, NOT_LISTED),
            other if other.is_upstream() => {
                error!("RxNorm request failed: {}", other);
                self::message(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
            other => {
                error!("Request failed: {}", other);
                self::message(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
        }
    }
}
