//! RxNav REST client.

use super::types::{DrugsResponse, HistoryStatusResponse};
use super::TerminologySource;
use crate::config::RxNormConfig;
use crate::models::DrugRecord;
use crate::network::HttpClient;
use crate::{Result, RxListError};
use async_trait::async_trait;
use reqwest::Response;
use tracing::{debug, error};

/// Client for the RxNav REST API.
#[derive(Debug, Clone)]
pub struct RxNormClient {
    http: HttpClient,
    base_url: String,
}

impl RxNormClient {
    /// Create a client against the public RxNav endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(HttpClient::new()?, RxNormConfig::BASE_URL)
    }

    /// Create a client against a custom base URL (mirrors, tests).
    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| RxListError::Config {
            message: format!("Invalid RxNorm base URL '{}': {}", base_url, e),
        })?;

        Ok(Self { http, base_url })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, name: &str) -> Result<String> {
        let url = url::Url::parse_with_params(
            &format!("{}/drugs.json", self.base_url),
            &[
                ("name", name),
                ("allsrc", "1"),
                ("tty", RxNormConfig::SEARCH_TERM_TYPE),
            ],
        )
        .map_err(|e| RxListError::Config {
            message: format!("Failed to build search URL: {}", e),
        })?;
        Ok(url.into())
    }

    fn rxcui_url(&self, rxcui: &str) -> String {
        format!("{}/rxcui/{}.json", self.base_url, urlencoding::encode(rxcui))
    }

    fn history_status_url(&self, rxcui: &str) -> String {
        format!(
            "{}/rxcui/{}/historystatus.json",
            self.base_url,
            urlencoding::encode(rxcui)
        )
    }

    async fn log_failure(context: &str, rxcui: Option<&str>, response: Response) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if HttpClient::is_not_found(status) {
            debug!(?rxcui, %status, "RxNorm {} returned not found", context);
        } else {
            error!(?rxcui, %status, body = %body, "RxNorm {} API failed", context);
        }
    }
}

#[async_trait]
impl TerminologySource for RxNormClient {
    async fn check_exists(&self, rxcui: &str) -> Result<bool> {
        let response = self.http.get(&self.rxcui_url(rxcui)).await?;
        Ok(response.status().is_success())
    }

    async fn fetch_details(&self, rxcui: &str) -> Result<Option<DrugRecord>> {
        let url = self.history_status_url(rxcui);
        let response = self.http.get(&url).await?;

        if !response.status().is_success() {
            Self::log_failure("getDrugDetails", Some(rxcui), response).await;
            return Ok(None);
        }

        let payload: HistoryStatusResponse = HttpClient::json(response, &url).await?;
        payload.into_drug_record(rxcui).map(Some)
    }

    async fn find_candidates(&self, name: &str) -> Result<Vec<String>> {
        let url = self.search_url(name)?;
        let response = self.http.get(&url).await?;

        if !response.status().is_success() {
            Self::log_failure("searchDrugs", None, response).await;
            return Ok(Vec::new());
        }

        let payload: DrugsResponse = HttpClient::json(response, &url).await?;
        let candidates: Vec<String> = payload
            .candidate_rxcuis()
            .take(RxNormConfig::MAX_CANDIDATES)
            .map(String::from)
            .collect();

        debug!("RxNorm search '{}' returned {} candidates", name, candidates.len());
        Ok(candidates)
    }
}
