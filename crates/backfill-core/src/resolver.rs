use crate::error::ImportError;
use crate::selector::select_candidates;
use crate::store::DisambiguationStore;
use backfill_models::{Season, ShowCandidate};
use backfill_sources::ShowCatalog;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Typed at the prompt to skip a show for good.
pub const SKIP_TOKEN: &str = "SKIP";

/// Everything a human needs to pick between candidates.
#[derive(Debug)]
pub struct PromptRequest<'a> {
    /// Display name exactly as the export spells it
    pub show_name: &'a str,
    pub year: Option<i32>,
    /// Row that triggered the question, e.g. `S02E05`
    pub context: &'a str,
    pub candidates: &'a [ShowCandidate],
}

/// The "ask a human" capability used when a show name is ambiguous.
///
/// `read_selection` blocks until a line is entered and returns
/// [`ImportError::Cancelled`] when the user interrupts.
pub trait Prompter: Send + Sync {
    fn present(&self, request: &PromptRequest<'_>);

    fn read_selection(&self) -> Result<String, ImportError>;

    /// Called after input that was neither an index nor the skip token.
    fn reject(&self, _input: &str, _candidate_count: usize) {}
}

/// A valid answer at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based index into the candidate list
    Index(usize),
    Skip,
}

/// Parse a 1-based index or the skip token. `None` means ask again.
pub fn parse_selection(input: &str, candidate_count: usize) -> Option<Choice> {
    let input = input.trim();
    if input.eq_ignore_ascii_case(SKIP_TOKEN) {
        return Some(Choice::Skip);
    }

    match input.parse::<usize>() {
        Ok(n) if (1..=candidate_count).contains(&n) => Some(Choice::Index(n - 1)),
        _ => None,
    }
}

/// Why a show name did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    NoCandidates,
    Skipped,
    /// The stored index points past the end of today's candidate list
    StaleSelection,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Show(ShowCandidate),
    None(Unresolved),
}

/// Turns raw show names into catalog shows, asking a human when needed.
///
/// Holds per-run caches: a show name and year hint resolve at most once per
/// run, and season listings are fetched at most once per show.
pub struct Resolver<'a> {
    catalog: &'a dyn ShowCatalog,
    store: &'a dyn DisambiguationStore,
    prompter: &'a dyn Prompter,
    resolved: HashMap<(String, Option<i32>), Resolution>,
    seasons: HashMap<String, Vec<Season>>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        catalog: &'a dyn ShowCatalog,
        store: &'a dyn DisambiguationStore,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            catalog,
            store,
            prompter,
            resolved: HashMap::new(),
            seasons: HashMap::new(),
        }
    }

    pub async fn resolve(
        &mut self,
        show_name: &str,
        year_hint: Option<i32>,
        context: &str,
    ) -> Result<Resolution, ImportError> {
        let memo_key = (show_name.to_string(), year_hint);
        if let Some(resolution) = self.resolved.get(&memo_key) {
            return Ok(resolution.clone());
        }

        let resolution = self.resolve_uncached(show_name, year_hint, context).await?;
        self.resolved.insert(memo_key, resolution.clone());
        Ok(resolution)
    }

    async fn resolve_uncached(
        &mut self,
        show_name: &str,
        year_hint: Option<i32>,
        context: &str,
    ) -> Result<Resolution, ImportError> {
        let selection = select_candidates(self.catalog, show_name, year_hint).await?;
        let mut candidates = selection.candidates;

        match candidates.len() {
            0 => {
                info!("No match for '{}' on {}", show_name, self.catalog.catalog_name());
                return Ok(Resolution::None(Unresolved::NoCandidates));
            }
            1 => {
                let mut show = candidates.remove(0);
                self.hydrate(&mut show).await?;
                debug!("'{}' matched {} ({})", show_name, show.title, show.link());
                return Ok(Resolution::Show(show));
            }
            _ => {}
        }

        if let Some(record) = self.store.lookup(show_name)? {
            if record.skip {
                info!("'{}' is marked as skipped", show_name);
                return Ok(Resolution::None(Unresolved::Skipped));
            }
            return match candidates.get(record.selected_index).cloned() {
                Some(mut show) => {
                    self.hydrate(&mut show).await?;
                    debug!("'{}' uses stored choice {} ({})", show_name, record.selected_index + 1, show.link());
                    Ok(Resolution::Show(show))
                }
                None => {
                    warn!(
                        "Stored choice {} for '{}' is out of range ({} candidates now); edit or remove the entry to choose again",
                        record.selected_index + 1,
                        show_name,
                        candidates.len()
                    );
                    Ok(Resolution::None(Unresolved::StaleSelection))
                }
            };
        }

        for candidate in candidates.iter_mut() {
            self.hydrate(candidate).await?;
        }

        let request = PromptRequest {
            show_name,
            year: selection.year,
            context,
            candidates: &candidates,
        };
        match self.ask(&request)? {
            Choice::Skip => {
                self.store.record_skip(show_name)?;
                info!("'{}' will be skipped from now on", show_name);
                Ok(Resolution::None(Unresolved::Skipped))
            }
            Choice::Index(index) => {
                self.store.record_selection(show_name, index)?;
                let show = candidates.swap_remove(index);
                info!("'{}' matched {} ({})", show_name, show.title, show.link());
                Ok(Resolution::Show(show))
            }
        }
    }

    /// Prompt until the answer is usable. Bad input is not limited.
    fn ask(&self, request: &PromptRequest<'_>) -> Result<Choice, ImportError> {
        self.prompter.present(request);
        loop {
            let input = self.prompter.read_selection()?;
            if let Some(choice) = parse_selection(&input, request.candidates.len()) {
                return Ok(choice);
            }
            error!(
                "'{}' is not a number between 1 and {} or {}",
                input.trim(),
                request.candidates.len(),
                SKIP_TOKEN
            );
            self.prompter.reject(&input, request.candidates.len());
        }
    }

    /// Fill in the season listing, fetching it on first use.
    async fn hydrate(&mut self, show: &mut ShowCandidate) -> Result<(), ImportError> {
        if !show.seasons.is_empty() {
            return Ok(());
        }
        let key = show.cache_key();
        if let Some(seasons) = self.seasons.get(&key) {
            show.seasons = seasons.clone();
            return Ok(());
        }

        let seasons = self.catalog.seasons(show).await?;
        self.seasons.insert(key, seasons.clone());
        show.seasons = seasons;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{show, FakeCatalog, MemoryStore, ScriptedPrompter};

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 3), Some(Choice::Index(0)));
        assert_eq!(parse_selection(" 3 \n", 3), Some(Choice::Index(2)));
        assert_eq!(parse_selection("SKIP", 3), Some(Choice::Skip));
        assert_eq!(parse_selection("skip", 3), Some(Choice::Skip));
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("-1", 3), None);
        assert_eq!(parse_selection("two", 3), None);
        assert_eq!(parse_selection("", 3), None);
    }

    fn doctor_who_catalog() -> FakeCatalog {
        FakeCatalog::new().with_search(
            "Doctor Who",
            vec![
                show("Doctor Who", Some(1963), "doctor-who", &[(1, 8)]),
                show("Doctor Who", Some(2005), "doctor-who-2005", &[(1, 13), (2, 13)]),
            ],
        )
    }

    #[tokio::test]
    async fn test_single_candidate_never_prompts() {
        let catalog = FakeCatalog::new().with_search(
            "Firefly",
            vec![show("Firefly", Some(2002), "firefly", &[(1, 14)])],
        );
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&[]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let resolution = resolver.resolve("Firefly", None, "S01E01").await.unwrap();
        match resolution {
            Resolution::Show(show) => {
                assert_eq!(show.ids.slug.as_deref(), Some("firefly"));
                assert!(show.find_episode(1, 14).is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(prompter.presented(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_resolves_to_none() {
        let catalog = FakeCatalog::new();
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&[]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let resolution = resolver.resolve("Unknown Show", None, "S01E01").await.unwrap();
        assert!(matches!(resolution, Resolution::None(Unresolved::NoCandidates)));
    }

    #[tokio::test]
    async fn test_prompt_records_selection_and_retries_bad_input() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&["hello", "7", "2"]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let resolution = resolver.resolve("Doctor Who", None, "S01E01").await.unwrap();
        match resolution {
            Resolution::Show(show) => assert_eq!(show.year, Some(2005)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(prompter.presented(), 1);
        assert_eq!(prompter.rejected(), 2);

        let record = store.lookup("Doctor Who").unwrap().unwrap();
        assert_eq!(record.selected_index, 1);
        assert!(!record.skip);

        // Prompt showed season counts, so both candidates were hydrated
        assert_eq!(catalog.season_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolution_is_memoized_within_a_run() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&["1"]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        resolver.resolve("Doctor Who", None, "S01E01").await.unwrap();
        resolver.resolve("Doctor Who", None, "S01E02").await.unwrap();

        assert_eq!(catalog.search_calls(), 1);
        assert_eq!(prompter.presented(), 1);
    }

    #[tokio::test]
    async fn test_stored_selection_is_reused() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        store.record_selection("Doctor Who", 0).unwrap();
        let prompter = ScriptedPrompter::new(&[]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        match resolver.resolve("Doctor Who", None, "S01E01").await.unwrap() {
            Resolution::Show(show) => assert_eq!(show.year, Some(1963)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(prompter.presented(), 0);
    }

    #[tokio::test]
    async fn test_stale_stored_index_resolves_to_none() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        store.record_selection("Doctor Who", 5).unwrap();
        let prompter = ScriptedPrompter::new(&[]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let resolution = resolver.resolve("Doctor Who", None, "S01E01").await.unwrap();
        assert!(matches!(resolution, Resolution::None(Unresolved::StaleSelection)));
        assert_eq!(store.lookup("Doctor Who").unwrap().unwrap().selected_index, 5);
    }

    #[tokio::test]
    async fn test_skip_answer_is_persisted() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&["SKIP"]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let resolution = resolver.resolve("Doctor Who", None, "S01E01").await.unwrap();
        assert!(matches!(resolution, Resolution::None(Unresolved::Skipped)));
        assert!(store.lookup("Doctor Who").unwrap().unwrap().skip);
    }

    #[tokio::test]
    async fn test_cancel_at_prompt_stops_resolution() {
        let catalog = doctor_who_catalog();
        let store = MemoryStore::default();
        let prompter = ScriptedPrompter::new(&[]);
        let mut resolver = Resolver::new(&catalog, &store, &prompter);

        let err = resolver.resolve("Doctor Who", None, "S01E01").await.unwrap_err();
        assert!(matches!(err, ImportError::Cancelled));
        assert!(store.is_empty());
    }
}
