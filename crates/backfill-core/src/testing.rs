//! In-memory collaborators for unit tests.

use crate::error::{ImportError, StoreError};
use crate::resolver::{PromptRequest, Prompter};
use crate::store::{DisambiguationStore, ImportLedger};
use async_trait::async_trait;
use backfill_models::{DisambiguationRecord, Episode, Season, ShowCandidate, ShowIds};
use backfill_sources::{ShowCatalog, SourceError};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A show with `(season, episode_count)` seasons, episode trakt ids numbered from 1000.
pub fn show(title: &str, year: Option<i32>, slug: &str, seasons: &[(u32, u32)]) -> ShowCandidate {
    let mut candidate = ShowCandidate::new(
        title,
        year,
        ShowIds {
            slug: Some(slug.to_string()),
            ..ShowIds::default()
        },
    );
    candidate.seasons = seasons
        .iter()
        .map(|&(number, count)| Season {
            number,
            episodes: (1..=count)
                .map(|e| Episode {
                    number: e,
                    title: None,
                    trakt_id: Some(1000 + u64::from(number) * 100 + u64::from(e)),
                })
                .collect(),
        })
        .collect();
    candidate
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub slug: String,
    pub season: u32,
    pub episode: u32,
    pub watched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct FakeCatalog {
    results: HashMap<String, Vec<ShowCandidate>>,
    seasons: HashMap<String, Vec<Season>>,
    write_failures: Mutex<VecDeque<SourceError>>,
    search_failures: Mutex<VecDeque<SourceError>>,
    writes: Mutex<Vec<Write>>,
    search_calls: AtomicUsize,
    season_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search results for `title`; their seasons are served by `seasons()` instead.
    pub fn with_search(mut self, title: &str, shows: Vec<ShowCandidate>) -> Self {
        let stripped = shows
            .into_iter()
            .map(|mut s| {
                self.seasons.insert(s.cache_key(), std::mem::take(&mut s.seasons));
                s
            })
            .collect();
        self.results.insert(title.to_string(), stripped);
        self
    }

    pub fn fail_writes(self, errors: Vec<SourceError>) -> Self {
        self.write_failures.lock().unwrap().extend(errors);
        self
    }

    pub fn fail_searches(self, errors: Vec<SourceError>) -> Self {
        self.search_failures.lock().unwrap().extend(errors);
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn season_calls(&self) -> usize {
        self.season_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShowCatalog for FakeCatalog {
    fn catalog_name(&self) -> &str {
        "fake"
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn search_shows(&self, title: &str) -> Result<Vec<ShowCandidate>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.search_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.results.get(title).cloned().unwrap_or_default())
    }

    async fn seasons(&self, show: &ShowCandidate) -> Result<Vec<Season>, SourceError> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.seasons.get(&show.cache_key()).cloned().unwrap_or_default())
    }

    async fn mark_watched(
        &self,
        show: &ShowCandidate,
        season: u32,
        episode: &Episode,
        watched_at: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError> {
        if let Some(err) = self.write_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.writes.lock().unwrap().push(Write {
            slug: show.cache_key(),
            season,
            episode: episode.number,
            watched_at,
        });
        Ok(())
    }
}

/// Answers prompts from a fixed script; an exhausted script acts like Ctrl-C.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    presented: AtomicUsize,
    rejected: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            presented: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

impl Prompter for ScriptedPrompter {
    fn present(&self, _request: &PromptRequest<'_>) {
        self.presented.fetch_add(1, Ordering::SeqCst);
    }

    fn read_selection(&self) -> Result<String, ImportError> {
        self.answers.lock().unwrap().pop_front().ok_or(ImportError::Cancelled)
    }

    fn reject(&self, _input: &str, _candidate_count: usize) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }
}

/// Both stores in memory, first write wins like the JSON ones.
#[derive(Default)]
pub struct MemoryStore {
    decisions: Mutex<HashMap<String, DisambiguationRecord>>,
    imported: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn is_empty(&self) -> bool {
        self.decisions.lock().unwrap().is_empty()
    }

    pub fn imported_count(&self) -> usize {
        self.imported.lock().unwrap().len()
    }
}

impl DisambiguationStore for MemoryStore {
    fn lookup(&self, show_name: &str) -> Result<Option<DisambiguationRecord>, StoreError> {
        Ok(self.decisions.lock().unwrap().get(show_name).cloned())
    }

    fn record_skip(&self, show_name: &str) -> Result<(), StoreError> {
        self.decisions
            .lock()
            .unwrap()
            .entry(show_name.to_string())
            .or_insert_with(|| DisambiguationRecord::skipped(show_name));
        Ok(())
    }

    fn record_selection(&self, show_name: &str, selected_index: usize) -> Result<(), StoreError> {
        self.decisions
            .lock()
            .unwrap()
            .entry(show_name.to_string())
            .or_insert_with(|| DisambiguationRecord::selection(show_name, selected_index));
        Ok(())
    }
}

impl ImportLedger for MemoryStore {
    fn contains(&self, episode_id: &str) -> Result<bool, StoreError> {
        Ok(self.imported.lock().unwrap().contains(episode_id))
    }

    fn record(&self, episode_id: &str) -> Result<(), StoreError> {
        self.imported.lock().unwrap().insert(episode_id.to_string());
        Ok(())
    }
}
