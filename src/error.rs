//! Error types for catalog_sync

use std::fmt;

/// Unified error type for catalog reconciliation operations
///
/// This is the infrastructure error channel. Per-set and per-card problems
/// (failed fetches, ambiguous labels, rejected inserts) are recorded into the
/// checkpoint instead and never abort a run; the search client reports
/// exhausted retries as a value rather than through this type.
#[derive(Debug)]
pub enum ImportError {
    /// Failed to parse the checkpoint JSON
    Parse(serde_json::Error),
    /// Database operation failed
    Database(rusqlite::Error),
    /// Checkpoint or stop-file I/O failed
    Io(std::io::Error),
    /// Required configuration is missing or invalid; aborts before any set
    FatalConfig(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(e) => write!(f, "Parse error: {}", e),
            ImportError::Database(e) => write!(f, "Database error: {}", e),
            ImportError::Io(e) => write!(f, "I/O error: {}", e),
            ImportError::FatalConfig(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Parse(e) => Some(e),
            ImportError::Database(e) => Some(e),
            ImportError::Io(e) => Some(e),
            ImportError::FatalConfig(_) => None,
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Parse(err)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err)
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

/// Result alias for catalog_sync operations
pub type Result<T> = std::result::Result<T, ImportError>;
