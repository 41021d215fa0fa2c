//! Centralized configuration for RxList.
//!
//! Fixed policy values (TTLs, rate limits, validation bounds) live here as
//! associated constants. Deployment settings (bind address, database path,
//! tokens) come from the server's command line.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "RxList";
    pub const USER_AGENT: &'static str = "rxlist/0.1";
    pub const DATA_DIR_NAME: &'static str = "rxlist";
    pub const DATABASE_FILENAME: &'static str = "rxlist.sqlite";
}

/// RxNav REST API settings.
pub struct RxNormConfig;

impl RxNormConfig {
    pub const BASE_URL: &'static str = "https://rxnav.nlm.nih.gov/REST";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    /// Term type searched by name: Semantic Branded Drug.
    pub const SEARCH_TERM_TYPE: &'static str = "SBD";
    /// Upper bound on candidates taken from one name search.
    pub const MAX_CANDIDATES: usize = 50;
}

/// Result cache settings.
pub struct CacheSettings;

impl CacheSettings {
    pub const TTL: Duration = Duration::from_secs(600);
    pub const MEMORY_MAX_ENTRIES: u64 = 10_000;

    pub const SEARCH_NAMESPACE: &'static str = "drug_search";
    pub const DETAILS_NAMESPACE: &'static str = "drug_details";
    pub const VALIDATION_NAMESPACE: &'static str = "rxcui_validation";
}

/// Search endpoint rate limiting.
pub struct RateLimitConfig;

impl RateLimitConfig {
    pub const MAX_ATTEMPTS: u32 = 10;
    pub const WINDOW: Duration = Duration::from_secs(60);
    pub const SEARCH_KEY_PREFIX: &'static str = "drug_search_";
}

/// Search aggregation settings.
pub struct SearchConfig;

impl SearchConfig {
    pub const DEFAULT_LIMIT: usize = 5;
}

/// Inbound request validation bounds.
pub struct ValidationConfig;

impl ValidationConfig {
    pub const DRUG_NAME_MIN_CHARS: usize = 2;
    pub const DRUG_NAME_MAX_CHARS: usize = 100;
    pub const RXCUI_MAX_CHARS: usize = 50;
}

/// HTTP server settings.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}

/// SQLite connection settings shared by every store.
pub struct DatabaseConfig;

impl DatabaseConfig {
    pub const BUSY_TIMEOUT_MS: u32 = 5_000;
    /// Expired rows are deleted on every Nth write to a shared store.
    pub const SWEEP_EVERY_WRITES: u64 = 256;
    /// Period of the server's background expiry sweep.
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
}
