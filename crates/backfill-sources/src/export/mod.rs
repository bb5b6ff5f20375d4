//! Readers for watch-history exports from the originating tracker.
//!
//! Each reader yields rows in file order and refuses an export in which two
//! rows share an episode identifier.

mod tv_time;
mod twee;

use backfill_models::WatchedEpisodeRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use tv_time::parse_tv_time_csv;
pub use twee::parse_twee_backup;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid {field} '{value}' for show '{show}'")]
    InvalidField {
        show: String,
        field: &'static str,
        value: String,
    },

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("the episode ID \"{0}\" exists for more than one episode")]
    DuplicateEpisodeId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pick from the file extension: `.csv` is TV Time, anything else Twee
    Auto,
    Twee,
    TvTime,
}

impl ExportFormat {
    pub fn detect(self, path: &Path) -> ExportFormat {
        match self {
            ExportFormat::Auto => {
                let is_csv = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false);
                if is_csv {
                    ExportFormat::TvTime
                } else {
                    ExportFormat::Twee
                }
            }
            explicit => explicit,
        }
    }
}

/// Read every watched episode from an export file.
pub fn read_export(path: &Path, format: ExportFormat) -> Result<Vec<WatchedEpisodeRow>, ExportError> {
    let rows = match format.detect(path) {
        ExportFormat::TvTime => parse_tv_time_csv(path)?,
        _ => {
            let content = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_twee_backup(&content)?
        }
    };

    info!(
        path = %path.display(),
        rows = rows.len(),
        "Loaded watched episodes from export"
    );
    Ok(rows)
}

/// Fail on the first identifier seen twice. Never dedupes.
pub(crate) fn ensure_unique_ids(rows: &[WatchedEpisodeRow]) -> Result<(), ExportError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.episode_id.as_str()) {
            return Err(ExportError::DuplicateEpisodeId(row.episode_id.clone()));
        }
    }
    Ok(())
}

/// Accepts RFC 3339, naive ISO date-times (read as UTC) and bare dates (midnight UTC).
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
