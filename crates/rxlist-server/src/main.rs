//! RxList Server - drug search and medication list HTTP API.
//!
//! Wraps rxlist-core in an axum application. Shared state (result cache,
//! rate limit windows, medication lists) lives in one SQLite database so
//! several server processes can run against the same file.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rxlist_core::config::{AppConfig, DatabaseConfig, RxNormConfig, ServerConfig};
use rxlist_core::network::HttpClient;
use rxlist_core::{
    CacheBackend, DrugService, MedicationList, MedicationStore, MemoryCache,
    MemoryRateLimitStore, RateLimitStore, RateLimiter, ResultCache, RxNormClient, SqliteCache,
    SqliteRateLimitStore,
};
use rxlist_server::{spawn_expiry_sweep, start_server, AppState, TokenRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where cache entries and rate limit windows are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SharedStore {
    /// Process-local; lost on restart
    Memory,
    /// In the SQLite database, shared with other processes
    Sqlite,
}

#[derive(Parser, Debug)]
#[command(name = "rxlist-server")]
#[command(about = "HTTP API for RxNorm drug search and medication lists")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "RXLIST_PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "RXLIST_HOST", default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// SQLite database path (defaults to the platform data directory)
    #[arg(long, env = "RXLIST_DATABASE")]
    database: Option<PathBuf>,

    /// RxNav REST base URL
    #[arg(long, env = "RXLIST_RXNORM_URL", default_value = RxNormConfig::BASE_URL)]
    rxnorm_url: String,

    /// Accepted bearer tokens as token=user_id, comma separated
    #[arg(long = "api-token", env = "RXLIST_API_TOKENS", value_delimiter = ',')]
    api_tokens: Vec<String>,

    /// Backend for the result cache and rate limit windows
    #[arg(long, env = "RXLIST_CACHE_BACKEND", value_enum, default_value_t = SharedStore::Sqlite)]
    cache_backend: SharedStore,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn default_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not determine the platform data directory")?;
    Ok(data_dir
        .join(AppConfig::DATA_DIR_NAME)
        .join(AppConfig::DATABASE_FILENAME))
}

fn build_state(args: &Args) -> Result<AppState> {
    let database = match &args.database {
        Some(path) => path.clone(),
        None => default_database_path()?,
    };
    info!("Database: {}", database.display());

    let (cache, rate_store): (Arc<dyn CacheBackend>, Arc<dyn RateLimitStore>) =
        match args.cache_backend {
            SharedStore::Memory => (
                Arc::new(MemoryCache::new()),
                Arc::new(MemoryRateLimitStore::new()),
            ),
            SharedStore::Sqlite => (
                Arc::new(SqliteCache::new(&database)?),
                Arc::new(SqliteRateLimitStore::new(&database)?),
            ),
        };
    info!("Cache backend: {:?}", args.cache_backend);
    spawn_expiry_sweep(
        cache.clone(),
        rate_store.clone(),
        DatabaseConfig::SWEEP_INTERVAL,
    );

    let source = RxNormClient::with_base_url(HttpClient::new()?, args.rxnorm_url.as_str())?;
    info!("RxNorm endpoint: {}", source.base_url());

    let drugs = DrugService::new(Arc::new(source), ResultCache::new(cache));
    let store = MedicationStore::open(&database)?;

    let tokens = TokenRegistry::parse(args.api_tokens.iter().map(String::as_str))?;
    if tokens.is_empty() {
        warn!("No API tokens configured; medication routes will reject every request");
    }

    Ok(AppState {
        medications: MedicationList::new(Arc::new(store), drugs.clone()),
        drugs,
        search_limiter: RateLimiter::for_search(rate_store),
        tokens,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug, args.log_json);

    info!("Starting {} server", AppConfig::APP_NAME);

    let state = build_state(&args)?;
    let addr = start_server(Arc::new(state), &args.host, args.port).await?;

    info!("{} running on http://{}", AppConfig::APP_NAME, addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
