use crate::error::ImportError;
use crate::resolver::{Prompter, Resolution, Resolver, Unresolved};
use crate::store::{DisambiguationStore, ImportLedger};
use crate::throttle::ThrottledCatalog;
use backfill_config::ImportConfig;
use backfill_models::{ShowCandidate, WatchedEpisodeRow};
use backfill_sources::{ShowCatalog, SourceError};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Run-wide knobs, built once from the config file and the command line.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub request_spacing: Duration,
    pub cooldown: Duration,
    pub max_error_streak: u32,
    pub dry_run: bool,
}

impl ImportSettings {
    pub fn from_config(config: &ImportConfig, dry_run: bool) -> Self {
        Self {
            request_spacing: Duration::from_millis(config.request_spacing_ms),
            cooldown: Duration::from_secs(config.rate_limit_cooldown_seconds),
            max_error_streak: config.max_error_streak,
            dry_run,
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default(), false)
    }
}

/// Per-row tallies for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub already_imported: usize,
    /// Resolved and located, but not written because of `--dry-run`
    pub previewed: usize,
    pub unmatched: usize,
    pub missing_episode: usize,
    /// Given up after too many consecutive transient failures
    pub abandoned: usize,
    /// Rejected by the catalog (not found or other API error)
    pub failed: usize,
    pub dry_run: bool,
}

enum RowOutcome {
    Imported,
    Previewed,
    Unmatched,
    MissingEpisode,
}

/// Walks export rows in order and marks each matched episode as watched once.
pub struct ImportDriver<'a> {
    catalog: &'a dyn ShowCatalog,
    decisions: &'a dyn DisambiguationStore,
    ledger: &'a dyn ImportLedger,
    prompter: &'a dyn Prompter,
    settings: ImportSettings,
}

impl<'a> ImportDriver<'a> {
    pub fn new(
        catalog: &'a dyn ShowCatalog,
        decisions: &'a dyn DisambiguationStore,
        ledger: &'a dyn ImportLedger,
        prompter: &'a dyn Prompter,
        settings: ImportSettings,
    ) -> Self {
        Self {
            catalog,
            decisions,
            ledger,
            prompter,
            settings,
        }
    }

    #[instrument(skip_all, fields(rows = rows.len(), dry_run = self.settings.dry_run))]
    pub async fn run(&self, rows: &[WatchedEpisodeRow]) -> Result<ImportSummary, ImportError> {
        if !self.catalog.is_authenticated() {
            return Err(ImportError::NotAuthenticated(self.catalog.catalog_name().to_string()));
        }

        let catalog = ThrottledCatalog::new(self.catalog, self.settings.request_spacing);
        let mut resolver = Resolver::new(&catalog, self.decisions, self.prompter);
        let mut summary = ImportSummary {
            total: rows.len(),
            dry_run: self.settings.dry_run,
            ..ImportSummary::default()
        };
        let mut error_streak: u32 = 0;

        for (index, row) in rows.iter().enumerate() {
            let position = format!("({}/{})", index + 1, rows.len());

            if self.ledger.contains(&row.episode_id)? {
                info!(
                    "{} - Already imported, skipping '{}' {}",
                    position, row.show_name, row.episode_label()
                );
                summary.already_imported += 1;
                continue;
            }

            loop {
                match self.import_row(&catalog, &mut resolver, row, &position).await {
                    Ok(outcome) => {
                        // Only a completed write clears the streak
                        match outcome {
                            RowOutcome::Imported => {
                                error_streak = 0;
                                summary.imported += 1;
                            }
                            RowOutcome::Previewed => summary.previewed += 1,
                            RowOutcome::Unmatched => summary.unmatched += 1,
                            RowOutcome::MissingEpisode => summary.missing_episode += 1,
                        }
                        break;
                    }
                    Err(ImportError::Source(e)) if e.is_transient() => {
                        error_streak += 1;
                        if error_streak > self.settings.max_error_streak {
                            warn!(
                                "{} - Failed {} times in a row, giving up on '{}' {}",
                                position, error_streak, row.show_name, row.episode_label()
                            );
                            summary.abandoned += 1;
                            error_streak = 0;
                            break;
                        }
                        self.cool_down(&e, &position, row).await;
                    }
                    Err(ImportError::Source(e)) if e.is_fatal() => {
                        return Err(ImportError::Source(e));
                    }
                    Err(ImportError::Source(e)) => {
                        warn!(
                            "{} - {} {} was rejected by {}: {}",
                            position, row.show_name, row.episode_label(), catalog.catalog_name(), e
                        );
                        summary.failed += 1;
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(
            "Import finished: {} imported, {} already imported, {} previewed, {} unmatched, {} missing, {} abandoned, {} failed",
            summary.imported,
            summary.already_imported,
            summary.previewed,
            summary.unmatched,
            summary.missing_episode,
            summary.abandoned,
            summary.failed
        );
        Ok(summary)
    }

    async fn cool_down(&self, error: &SourceError, position: &str, row: &WatchedEpisodeRow) {
        match error {
            SourceError::RateLimited { retry_after } => warn!(
                "{} - Hit the rate limit (server asked for {:?}); waiting {:?} before retrying. Consider raising request_spacing_ms",
                position, retry_after, self.settings.cooldown
            ),
            other => warn!(
                "{} - {} while processing '{}' {}; the service may be down. Waiting {:?} before retrying",
                position, other, row.show_name, row.episode_label(), self.settings.cooldown
            ),
        }
        tokio::time::sleep(self.settings.cooldown).await;
    }

    async fn import_row(
        &self,
        catalog: &dyn ShowCatalog,
        resolver: &mut Resolver<'_>,
        row: &WatchedEpisodeRow,
        position: &str,
    ) -> Result<RowOutcome, ImportError> {
        let show = match resolver
            .resolve(&row.show_name, row.show_year, &row.episode_label())
            .await?
        {
            Resolution::Show(show) => show,
            Resolution::None(reason) => {
                let why = match reason {
                    Unresolved::NoCandidates => "no match was found",
                    Unresolved::Skipped => "the show is marked as skipped",
                    Unresolved::StaleSelection => "the stored choice no longer fits the search results",
                };
                warn!("{} - Skipping '{}' {}: {}", position, row.show_name, row.episode_label(), why);
                return Ok(RowOutcome::Unmatched);
            }
        };

        info!(
            "{} - Processing '{}' {} matched as {} ({})",
            position,
            row.show_name,
            row.episode_label(),
            show.title,
            show.year.map(|y| y.to_string()).unwrap_or_else(|| "unknown year".to_string())
        );

        let Some(episode) = show.find_episode(row.season, row.episode) else {
            warn!(
                "{} - {} Season {}, Episode {} does not exist in {} ({})",
                position,
                row.show_name,
                row.season,
                row.episode,
                catalog.catalog_name(),
                show.episode_link(row.season, row.episode)
            );
            return Ok(RowOutcome::MissingEpisode);
        };

        if self.settings.dry_run {
            debug!("Dry run, not marking {} {} as watched", show.title, row.episode_label());
            return Ok(RowOutcome::Previewed);
        }

        self.mark_watched(catalog, &show, row, episode).await?;
        Ok(RowOutcome::Imported)
    }

    async fn mark_watched(
        &self,
        catalog: &dyn ShowCatalog,
        show: &ShowCandidate,
        row: &WatchedEpisodeRow,
        episode: &backfill_models::Episode,
    ) -> Result<(), ImportError> {
        catalog
            .mark_watched(show, row.season, episode, row.watched_at)
            .await?;
        // Only after the write succeeded
        self.ledger.record(&row.episode_id)?;
        Ok(())
    }
}
