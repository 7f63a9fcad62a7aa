//! Catalog Sync - Card Catalog Reconciliation CLI
//!
//! Launches (or resumes) a reconciliation run against the product-search
//! API, signals a running import to stop, or prints checkpoint status.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use catalog_sync::checkpoint::{CheckpointStore, JsonCheckpointStore};
use catalog_sync::config::{self, ImportConfig};
use catalog_sync::database;
use catalog_sync::driver::run_reconciliation;
use catalog_sync::error::ImportError;
use catalog_sync::matcher::DEFAULT_SIMILARITY_THRESHOLD;
use catalog_sync::pricecharting::{CatalogClient, QueryStyle};

/// Card catalog reconciliation - imports missing cards into SQLite
#[derive(Parser, Debug)]
#[command(name = "catalog_sync")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch or resume a reconciliation run
    Start {
        /// Path to the SQLite database file
        #[arg(short, long, default_value_t = config::default_db_path())]
        database: String,

        /// Checkpoint file (default: under the data directory)
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Maximum number of sets to process this run
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum delay after every API request, in milliseconds
        #[arg(long, default_value_t = 2000)]
        rate_ms: u64,

        /// Linear backoff step between retries, in milliseconds
        #[arg(long, default_value_t = 5000)]
        backoff_ms: u64,

        /// Similarity threshold for set matching
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,

        /// Build dash-joined lowercase queries instead of spaced phrases
        #[arg(long, default_value_t = false)]
        dashed_queries: bool,

        /// Search endpoint URL
        #[arg(long, default_value_t = config::DEFAULT_ENDPOINT.to_string())]
        endpoint: String,

        /// API auth token (default: the PRICECHARTING_TOKEN environment variable)
        #[arg(long)]
        token: Option<String>,
    },
    /// Request a running import to stop at the next set boundary
    Stop,
    /// Print the current checkpoint
    Status {
        /// Checkpoint file (default: under the data directory)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Start {
            database,
            checkpoint,
            limit,
            rate_ms,
            backoff_ms,
            threshold,
            dashed_queries,
            endpoint,
            token,
        } => {
            let config = ImportConfig {
                token: config::resolve_token(token).unwrap_or_default(),
                endpoint,
                query_style: if dashed_queries {
                    QueryStyle::Dashed
                } else {
                    QueryStyle::Spaced
                },
                rate_limit: Duration::from_millis(rate_ms),
                backoff: Duration::from_millis(backoff_ms),
                similarity_threshold: threshold,
                limit,
            };
            let checkpoint_path = checkpoint.unwrap_or_else(config::default_checkpoint_path);
            run_start(&database, checkpoint_path, config).await
        }
        Command::Stop => run_stop(),
        Command::Status { checkpoint } => {
            run_status(checkpoint.unwrap_or_else(config::default_checkpoint_path))
        }
    };

    std::process::exit(exit_code);
}

async fn run_start(database: &str, checkpoint_path: PathBuf, config: ImportConfig) -> i32 {
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return 1;
    }

    log::info!("Starting catalog_sync...");
    log::info!("Database path: {}", database);
    log::info!("Checkpoint path: {}", checkpoint_path.display());

    // Ensure parent directory exists
    let db_path = PathBuf::from(database);
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                return 2;
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            return 2;
        }
    };

    if let Err(e) = database::init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        return 2;
    }

    // Cooperative stop: Ctrl-C and the `stop` subcommand's marker file both
    // raise one flag, checked by the driver at each set boundary
    let stop = Arc::new(AtomicBool::new(false));

    let ctrl_c_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, stopping after the current set");
            ctrl_c_stop.store(true, Ordering::SeqCst);
        }
    });

    let stop_file = config::stop_file_path();
    let _ = std::fs::remove_file(&stop_file); // stale marker from a past run
    let watcher_stop = Arc::clone(&stop);
    let watched_file = stop_file.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            if watched_file.exists() {
                log::info!("Stop requested, stopping after the current set");
                watcher_stop.store(true, Ordering::SeqCst);
                break;
            }
        }
    });

    let client = CatalogClient::new(config.client_config());
    let mut store = JsonCheckpointStore::new(checkpoint_path);
    let match_config = config.match_config();

    let result = run_reconciliation(
        &conn,
        &mut store,
        &client,
        &match_config,
        config.limit,
        &stop,
        |event| {
            log::info!(
                "Processing set {}/{}: '{}' ({} cards added so far)",
                event.set_index + 1,
                event.total_sets,
                event.current_set_name,
                event.cards_added_so_far
            );
        },
    )
    .await;

    let _ = std::fs::remove_file(&stop_file);

    match result {
        Ok(summary) => {
            log::info!(
                "Reconciliation {}: {} sets processed, {} cards added",
                if summary.stopped { "stopped" } else { "complete" },
                summary.sets_processed,
                summary.cards_added
            );
            0
        }
        Err(ImportError::FatalConfig(msg)) => {
            log::error!("Configuration error: {}", msg);
            1
        }
        Err(e) => {
            // Checkpoint is preserved on disk; the next start resumes
            log::error!("Reconciliation aborted: {}", e);
            2
        }
    }
}

fn run_stop() -> i32 {
    let stop_file = config::stop_file_path();
    if let Some(parent) = stop_file.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("Failed to create data directory: {}", e);
            return 2;
        }
    }
    match std::fs::write(&stop_file, b"stop") {
        Ok(()) => {
            println!("Stop requested; the running import will halt at the next set boundary.");
            0
        }
        Err(e) => {
            log::error!("Failed to write stop file: {}", e);
            2
        }
    }
}

fn run_status(checkpoint_path: PathBuf) -> i32 {
    let store = JsonCheckpointStore::new(checkpoint_path);
    match store.load() {
        Ok(Some(cp)) => {
            println!(
                "Progress: {}/{} sets, {} cards added, {} sets processed",
                cp.set_index, cp.total_sets, cp.cards_added, cp.sets_processed
            );
            println!("Last updated: {}", cp.last_updated);
            println!("Errors recorded: {}", cp.errors.len());
            for record in cp.recent_errors(5) {
                println!("  [{}] {:?} {}: {}", record.at, record.kind, record.set_name, record.detail);
            }
            0
        }
        Ok(None) => {
            println!("No checkpoint found; no run has been started yet.");
            0
        }
        Err(e) => {
            log::error!("Failed to read checkpoint: {}", e);
            2
        }
    }
}
