pub mod episode_row;
pub mod show;
pub mod records;

pub use episode_row::WatchedEpisodeRow;
pub use show::{Episode, Season, ShowCandidate, ShowIds};
pub use records::{DisambiguationRecord, ImportedEpisodeRecord};
