use refweb_graph::CorpusError;
use rusqlite::ErrorCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record in {path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),

    #[error("Store unavailable after {attempts} attempts: {last}")]
    StoreUnavailable { attempts: u32, last: Box<CoreError> },

    #[error("Store is closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A population run is already in progress")]
    PopulationInProgress,

    #[error("Task join error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// Failures worth retrying: pool contention and SQLite lock conflicts
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::PoolTimeout(_) => true,
            CoreError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
