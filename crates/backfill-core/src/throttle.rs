use async_trait::async_trait;
use backfill_models::{Episode, Season, ShowCandidate};
use backfill_sources::{ShowCatalog, SourceError};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Enforces a minimum gap between consecutive calls to an external service.
pub struct Throttle {
    spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep until `spacing` has passed since the previous call, then claim the slot.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.spacing;
            let now = Instant::now();
            if ready_at > now {
                trace!("Throttling for {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// A catalog whose every call first waits on a shared [`Throttle`].
pub struct ThrottledCatalog<'a> {
    inner: &'a dyn ShowCatalog,
    throttle: Throttle,
}

impl<'a> ThrottledCatalog<'a> {
    pub fn new(inner: &'a dyn ShowCatalog, spacing: Duration) -> Self {
        Self {
            inner,
            throttle: Throttle::new(spacing),
        }
    }
}

#[async_trait]
impl ShowCatalog for ThrottledCatalog<'_> {
    fn catalog_name(&self) -> &str {
        self.inner.catalog_name()
    }

    fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    async fn search_shows(&self, title: &str) -> Result<Vec<ShowCandidate>, SourceError> {
        self.throttle.wait().await;
        self.inner.search_shows(title).await
    }

    async fn seasons(&self, show: &ShowCandidate) -> Result<Vec<Season>, SourceError> {
        self.throttle.wait().await;
        self.inner.seasons(show).await
    }

    async fn mark_watched(
        &self,
        show: &ShowCandidate,
        season: u32,
        episode: &Episode,
        watched_at: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError> {
        self.throttle.wait().await;
        self.inner.mark_watched(show, season, episode, watched_at).await
    }
}
