//! Error types for RxList.
//!
//! One error enum covers the whole core: upstream (RxNav) failures, local
//! storage failures, and the domain outcomes the HTTP layer turns into
//! status codes.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the RxList core.
#[derive(Debug, Error)]
pub enum RxListError {
    // Upstream errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Malformed upstream response: {message}")]
    Upstream { message: String },

    #[error("Rate limited for {subject}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        subject: String,
        retry_after_secs: Option<u64>,
    },

    // Storage errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Medication list errors
    #[error("Medication {rxcui} is already in the list")]
    Conflict { rxcui: String },

    #[error("Medication {rxcui} not found in the list")]
    NotFound { rxcui: String },

    #[error("Invalid RxCUI: {rxcui}")]
    InvalidRxcui { rxcui: String },

    #[error("Could not retrieve drug information for {rxcui}")]
    DrugDetailsUnavailable { rxcui: String },

    // Request errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unauthenticated")]
    Unauthenticated,

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for RxList operations.
pub type Result<T> = std::result::Result<T, RxListError>;

impl From<std::io::Error> for RxListError {
    fn from(err: std::io::Error) -> Self {
        RxListError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for RxListError {
    fn from(err: serde_json::Error) -> Self {
        RxListError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for RxListError {
    fn from(err: rusqlite::Error) -> Self {
        RxListError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for RxListError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RxListError::Timeout(crate::config::RxNormConfig::REQUEST_TIMEOUT)
        } else if err.is_decode() {
            RxListError::Upstream {
                message: err.to_string(),
            }
        } else {
            RxListError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl RxListError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RxListError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether the error came from talking to the terminology service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RxListError::Network { .. } | RxListError::Timeout(_) | RxListError::Upstream { .. }
        )
    }
}
