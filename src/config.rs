//! Runtime configuration
//!
//! The auth token comes from the environment (or a CLI flag), never from
//! source. Everything tunable at run time lives here so the driver and the
//! client read one validated struct.

use crate::error::{ImportError, Result};
use crate::matcher::{MatchConfig, DEFAULT_SIMILARITY_THRESHOLD};
use crate::pricecharting::{ClientConfig, QueryStyle, DEFAULT_BACKOFF, DEFAULT_RATE_LIMIT};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the product-search API token
pub const TOKEN_ENV: &str = "PRICECHARTING_TOKEN";

/// Default search endpoint of the product-search API
pub const DEFAULT_ENDPOINT: &str = "https://www.pricecharting.com/api/products";

/// Validated configuration for one reconciliation run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub token: String,
    pub endpoint: String,
    pub query_style: QueryStyle,
    pub rate_limit: Duration,
    pub backoff: Duration,
    pub similarity_threshold: f64,
    /// Maximum sets to process this run (None = whole backlog)
    pub limit: Option<usize>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            query_style: QueryStyle::Spaced,
            rate_limit: DEFAULT_RATE_LIMIT,
            backoff: DEFAULT_BACKOFF,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            limit: None,
        }
    }
}

impl ImportConfig {
    /// Check start-up requirements.
    ///
    /// A missing token or a nonsensical threshold is fatal before any set
    /// is processed; nothing else aborts a run.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ImportError::FatalConfig(format!(
                "Missing API token: set {} or pass --token",
                TOKEN_ENV
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ImportError::FatalConfig(format!(
                "Similarity threshold must be within [0.0, 1.0], got {}",
                self.similarity_threshold
            )));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ImportError::FatalConfig("Empty endpoint URL".to_string()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            query_style: self.query_style,
            rate_limit: self.rate_limit,
            backoff: self.backoff,
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            similarity_threshold: self.similarity_threshold,
        }
    }
}

/// Token from the CLI flag if given, otherwise from the environment
pub fn resolve_token(flag: Option<String>) -> Option<String> {
    flag.filter(|t| !t.trim().is_empty())
        .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()))
}

/// Data directory for all durable state: ~/.local/share/catalog_sync
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("catalog_sync")
}

/// Default SQLite database path
pub fn default_db_path() -> String {
    data_dir().join("catalog.db").to_string_lossy().to_string()
}

/// Default checkpoint file path
pub fn default_checkpoint_path() -> PathBuf {
    data_dir().join("checkpoint.json")
}

/// Stop-marker file; `catalog_sync stop` creates it, the running driver
/// picks it up at the next set boundary
pub fn stop_file_path() -> PathBuf {
    data_dir().join("stop")
}
