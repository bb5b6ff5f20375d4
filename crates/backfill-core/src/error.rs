use backfill_sources::SourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing one of the durable JSON stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid store. It is left in place for the
    /// operator to repair.
    #[error("{path} is not a valid store ({source}); fix or remove it by hand")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Conditions that stop an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cancelled by user")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("catalog error: {0}")]
    Source(#[from] SourceError),

    #[error("failed to read selection: {0}")]
    Prompt(String),

    #[error("{0} is not authenticated")]
    NotAuthenticated(String),
}
