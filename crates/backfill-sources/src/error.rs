use std::time::Duration;
use thiserror::Error;

/// Failures talking to the target catalog.
///
/// The import loop decides per variant whether to cool down and retry,
/// skip the row, or stop.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate limit exceeded (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("service unavailable: HTTP {0}")]
    Unavailable(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

impl SourceError {
    /// Worth waiting out and retrying the same request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::RateLimited { .. }
                | SourceError::Decode(_)
                | SourceError::Unavailable(_)
                | SourceError::Network(_)
        )
    }

    /// The session is gone; continuing would fail every remaining row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Unauthorized(_) | SourceError::NotAuthenticated)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}
