//! Catalog Sync - Card Catalog Reconciliation Engine
//!
//! Imports card data from an external product-search API into a two-level
//! internal catalog (sets containing cards). Matches external products to
//! internal sets, parses card names and catalog numbers out of free-text
//! labels, and inserts only genuinely missing cards - idempotent across
//! runs and resumable via a durable checkpoint.

pub mod checkpoint;
pub mod config;
pub mod database;
pub mod dedup;
pub mod driver;
pub mod error;
pub mod label;
pub mod matcher;
pub mod pricecharting;
pub mod similarity;

pub use checkpoint::{CheckpointStore, ImportCheckpoint, JsonCheckpointStore, MemoryCheckpointStore};
pub use config::ImportConfig;
pub use driver::{run_reconciliation, ProgressEvent, RunSummary};
pub use error::{ImportError, Result};
pub use pricecharting::{CatalogClient, SearchOutcome};
