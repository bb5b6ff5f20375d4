use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A human decision about an ambiguous show name.
///
/// Stored keyed by the exact display name. `selected_index` is a position in
/// the candidate list as the catalog ordered it when the choice was made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisambiguationRecord {
    pub show_name: String,
    pub selected_index: usize,
    pub skip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl DisambiguationRecord {
    pub fn selection(show_name: impl Into<String>, selected_index: usize) -> Self {
        Self {
            show_name: show_name.into(),
            selected_index,
            skip: false,
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn skipped(show_name: impl Into<String>) -> Self {
        Self {
            show_name: show_name.into(),
            selected_index: 0,
            skip: true,
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Marker that an episode was written to the target service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedEpisodeRecord {
    pub episode_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
}

impl ImportedEpisodeRecord {
    pub fn now(episode_id: impl Into<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            imported_at: Some(Utc::now()),
        }
    }
}
