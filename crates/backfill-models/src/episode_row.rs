use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One watched episode read from a source export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEpisodeRow {
    pub show_name: String, // Display name exactly as the export spells it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_year: Option<i32>, // First-aired year, when the export carries one
    pub episode_id: String, // Synthetic id, unique within one export
    pub season: u32,
    pub episode: u32,
    /// Timestamp sent as `watched_at`. Twee only stores the air date, TV Time
    /// stores when the episode was ticked off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

impl WatchedEpisodeRow {
    /// Short `S01E02` style label used in log lines.
    pub fn episode_label(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }
}
