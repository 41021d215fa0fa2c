//! HTTP client used for every call to the terminology service.
//!
//! Each method issues exactly one request. Non-2xx responses are returned
//! to the caller untouched so it can decide what "not found" means; only
//! transport failures and undecodable bodies become errors.

use crate::config::{AppConfig, RxNormConfig};
use crate::{Result, RxListError};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// HTTP client with a fixed request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default RxNav timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(RxNormConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| RxListError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self { client, timeout })
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RxListError::Timeout(self.timeout)
            } else {
                RxListError::Network {
                    message: format!("GET {} failed: {}", url, e),
                    cause: Some(e.to_string()),
                }
            }
        })?;

        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    /// Decode a successful response body as JSON.
    pub async fn json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(|e| RxListError::Network {
            message: format!("Failed to read body from {}: {}", url, e),
            cause: Some(e.to_string()),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| RxListError::Upstream {
            message: format!("Failed to parse response from {}: {}", extract_domain(url), e),
        })
    }

    /// Check if an HTTP status code means the resource does not exist.
    pub fn is_not_found(status: StatusCode) -> bool {
        matches!(status.as_u16(), 400 | 404 | 410)
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://rxnav.nlm.nih.gov/REST/drugs.json?name=x"),
            "rxnav.nlm.nih.gov"
        );
        assert_eq!(extract_domain("invalid-url"), "unknown");
    }

    #[test]
    fn test_not_found_status_codes() {
        assert!(HttpClient::is_not_found(StatusCode::NOT_FOUND));
        assert!(HttpClient::is_not_found(StatusCode::BAD_REQUEST));
        assert!(!HttpClient::is_not_found(StatusCode::OK));
        assert!(!HttpClient::is_not_found(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_client_with_timeout() {
        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
