use async_trait::async_trait;
use backfill_models::{Episode, Season, ShowCandidate};
use chrono::{DateTime, Utc};
use crate::error::SourceError;

/// The target catalog: show search, season listings and the watched-history write.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    fn catalog_name(&self) -> &str;

    // Authentication gate checked once before an import starts
    fn is_authenticated(&self) -> bool;

    /// Shows matching a plain title, in the catalog's own ranking order.
    async fn search_shows(&self, title: &str) -> Result<Vec<ShowCandidate>, SourceError>;

    /// Full season and episode listing for a show returned by `search_shows`.
    async fn seasons(&self, show: &ShowCandidate) -> Result<Vec<Season>, SourceError>;

    /// Add one episode to the watched history. `None` lets the service use "now".
    async fn mark_watched(
        &self,
        show: &ShowCandidate,
        season: u32,
        episode: &Episode,
        watched_at: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError>;
}
