use crate::matching::titles_match;
use crate::title::normalize_title;
use backfill_models::ShowCandidate;
use backfill_sources::{ShowCatalog, SourceError};
use tracing::debug;

/// Candidates that survived scoring and year filtering for one show name.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The name with any embedded year removed; this is what was searched for.
    pub query: String,
    /// Embedded year when present, otherwise the hint from the export row.
    pub year: Option<i32>,
    pub candidates: Vec<ShowCandidate>,
}

/// Narrow search results down to the shows that plausibly are `query`.
///
/// Provider order is preserved.
pub fn filter_candidates(query: &str, year: Option<i32>, results: Vec<ShowCandidate>) -> Vec<ShowCandidate> {
    let mut kept = Vec::new();

    for candidate in results {
        if !titles_match(query, &candidate.title) {
            continue;
        }

        match year {
            Some(year) if candidate.title == query && candidate.year == Some(year) => {
                // Exact title and year: nothing else can compete
                kept.clear();
                kept.push(candidate);
                break;
            }
            Some(year) => {
                if candidate.year == Some(year) {
                    kept.push(candidate);
                }
            }
            None => kept.push(candidate),
        }
    }

    let exact: Vec<usize> = kept
        .iter()
        .enumerate()
        .filter(|(_, c)| c.title == query)
        .map(|(i, _)| i)
        .collect();
    if exact.len() == 1 && kept.len() > 1 {
        let winner = kept.swap_remove(exact[0]);
        kept = vec![winner];
    }

    kept
}

/// Search the catalog for `raw_name` and filter the results.
pub async fn select_candidates(
    catalog: &dyn ShowCatalog,
    raw_name: &str,
    year_hint: Option<i32>,
) -> Result<Selection, SourceError> {
    let normalized = normalize_title(raw_name);
    let year = normalized.year.or(year_hint);

    let results = catalog.search_shows(&normalized.title).await?;
    let found = results.len();
    let candidates = filter_candidates(&normalized.title, year, results);

    debug!(
        "'{}' (year {:?}): {} search results, {} candidates",
        normalized.title, year, found, candidates.len()
    );

    Ok(Selection {
        query: normalized.title,
        year,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfill_models::ShowIds;

    fn show(title: &str, year: Option<i32>, slug: &str) -> ShowCandidate {
        ShowCandidate::new(
            title,
            year,
            ShowIds {
                slug: Some(slug.to_string()),
                ..ShowIds::default()
            },
        )
    }

    fn slugs(candidates: &[ShowCandidate]) -> Vec<&str> {
        candidates.iter().filter_map(|c| c.ids.slug.as_deref()).collect()
    }

    #[test]
    fn test_exact_title_and_year_wins() {
        let results = vec![
            show("Doctor Who", Some(1963), "doctor-who"),
            show("Doctor Who", Some(2005), "doctor-who-2005"),
            show("Doctor Who", Some(2023), "doctor-who-2023"),
        ];
        let kept = filter_candidates("Doctor Who", Some(2005), results);
        assert_eq!(slugs(&kept), vec!["doctor-who-2005"]);
    }

    #[test]
    fn test_no_year_keeps_every_scored_candidate() {
        let results = vec![
            show("Doctor Who", Some(1963), "doctor-who"),
            show("Doctor Who", Some(2005), "doctor-who-2005"),
            show("Doctor Who Confidential", Some(2005), "doctor-who-confidential"),
            show("Casualty", Some(1986), "casualty"),
        ];
        let kept = filter_candidates("Doctor Who", None, results);
        assert_eq!(
            slugs(&kept),
            vec!["doctor-who", "doctor-who-2005", "doctor-who-confidential"]
        );
    }

    #[test]
    fn test_year_filter_drops_other_years() {
        let results = vec![
            show("The Office (US)", Some(2005), "the-office-us"),
            show("The Office", Some(2001), "the-office"),
            show("The Office Girls", Some(2005), "the-office-girls"),
        ];
        // No exact title match for 2005, so both 2005 shows survive
        let kept = filter_candidates("The Office", Some(2005), results);
        assert_eq!(slugs(&kept), vec!["the-office-us", "the-office-girls"]);
    }

    #[test]
    fn test_single_exact_title_collapses_survivors() {
        let results = vec![
            show("The Americans Show", None, "the-americans-show"),
            show("The Americans", None, "the-americans"),
        ];
        let kept = filter_candidates("The Americans", None, results);
        assert_eq!(slugs(&kept), vec!["the-americans"]);
    }

    #[test]
    fn test_two_exact_titles_stay_ambiguous() {
        let results = vec![
            show("Shameless", Some(2004), "shameless"),
            show("Shameless", Some(2011), "shameless-2011"),
        ];
        let kept = filter_candidates("Shameless", None, results);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_blank_candidate_title_is_skipped() {
        let results = vec![show("", None, "blank"), show("Firefly", Some(2002), "firefly")];
        let kept = filter_candidates("Firefly", None, results);
        assert_eq!(slugs(&kept), vec!["firefly"]);
    }
}
