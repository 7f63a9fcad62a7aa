//! Product-search API client
//!
//! Wraps the remote card-price store's search endpoint
//! (`GET <endpoint>?query=<string>&auth=<token>`). Retry, backoff and the
//! provider's rate limit are enforced here and nowhere else, so callers
//! never sleep on their own.

use serde::Deserialize;
use std::time::Duration;

/// Total attempts per search before giving up
const MAX_ATTEMPTS: u32 = 3;

/// Default linear backoff step between failed attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Default mandatory delay after every request, per the provider's limits
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(2);

/// One product entry from a search response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchProduct {
    pub id: String,
    pub product_name: String,
    pub console_name: String,
    /// Prices in pennies, absent for unpriced products
    #[serde(default)]
    pub loose_price: Option<i64>,
    #[serde(default)]
    pub cib_price: Option<i64>,
    #[serde(default)]
    pub new_price: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl SearchProduct {
    /// Loose price in dollars, the value estimate stored on inserted cards
    pub fn estimated_value(&self) -> Option<f64> {
        self.loose_price.map(|pennies| pennies as f64 / 100.0)
    }
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<SearchProduct>,
}

/// How the search query string is built from a set name.
///
/// The store historically accepted both shapes; which one a deployment uses
/// is configuration, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStyle {
    /// Literal phrase, e.g. `1992 Marvel Masterpieces`
    #[default]
    Spaced,
    /// Lowercased dash-joined tokens, e.g. `1992-marvel-masterpieces`
    Dashed,
}

/// Build the search query string for a set name
pub fn build_query(set_name: &str, style: QueryStyle) -> String {
    match style {
        QueryStyle::Spaced => set_name.trim().to_string(),
        QueryStyle::Dashed => set_name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Search endpoint URL (overridable so tests can point at a mock server)
    pub endpoint: String,
    /// API auth token; comes from configuration, never from source
    pub token: String,
    pub query_style: QueryStyle,
    /// Mandatory post-request delay
    pub rate_limit: Duration,
    /// Linear backoff step: attempt n waits n * backoff
    pub backoff: Duration,
}

/// Outcome of one set's search call.
///
/// Exhausted retries are a value, not an `Err`: the caller records the
/// failure for this set and moves on to the next one.
#[derive(Debug)]
pub enum SearchOutcome {
    Products(Vec<SearchProduct>),
    FetchFailed {
        query: String,
        attempts: u32,
        reason: String,
    },
}

/// Product-search API client with built-in retry and rate limiting
pub struct CatalogClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Search the store for products matching a set name.
    ///
    /// Retries up to [`MAX_ATTEMPTS`] times with linear backoff on non-2xx
    /// responses and transport errors. The configured rate-limit delay is
    /// awaited after every request regardless of outcome.
    pub async fn search(&self, set_name: &str) -> SearchOutcome {
        let query = build_query(set_name, self.config.query_style);
        let url = format!(
            "{}?query={}&auth={}",
            self.config.endpoint,
            urlencoding::encode(&query),
            urlencoding::encode(&self.config.token)
        );

        let mut last_reason = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            log::debug!("Searching '{}' (attempt {}/{})", query, attempt, MAX_ATTEMPTS);
            let result = self.attempt(&url).await;

            // Inter-request delay applies even to failed calls
            tokio::time::sleep(self.config.rate_limit).await;

            match result {
                Ok(products) => {
                    log::info!("Search '{}' returned {} products", query, products.len());
                    return SearchOutcome::Products(products);
                }
                Err(reason) => {
                    log::warn!(
                        "Search '{}' attempt {}/{} failed: {}",
                        query,
                        attempt,
                        MAX_ATTEMPTS,
                        reason
                    );
                    last_reason = reason;
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(self.config.backoff * attempt).await;
                    }
                }
            }
        }

        SearchOutcome::FetchFailed {
            query,
            attempts: MAX_ATTEMPTS,
            reason: last_reason,
        }
    }

    async fn attempt(&self, url: &str) -> std::result::Result<Vec<SearchProduct>, String> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", "catalog_sync/1.0")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(parsed.products)
    }
}

#[cfg(test)]
#[path = "pricecharting_tests.rs"]
mod tests;
