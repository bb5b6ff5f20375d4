use regex::Regex;
use std::sync::OnceLock;

/// A show title with its embedded year pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTitle {
    pub title: String,
    pub year: Option<i32>,
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([A-Za-z0-9_]+)\)").expect("year pattern is valid"))
}

/// Split `"Doctor Who (2005)"` into `"Doctor Who"` and `2005`.
///
/// Only the first parenthesized token is looked at. When it is not a number
/// the title comes back untouched and without a year. A digit run that does
/// not fit in an `i32` is treated the same way, since it cannot be a year.
pub fn normalize_title(raw: &str) -> NormalizedTitle {
    let year = year_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|token| token.as_str().parse::<i32>().ok());

    match year {
        Some(year) => {
            let title = raw.split('(').next().unwrap_or(raw).trim().to_string();
            NormalizedTitle { title, year: Some(year) }
        }
        None => NormalizedTitle {
            title: raw.to_string(),
            year: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_year() {
        assert_eq!(
            normalize_title("Doctor Who (2005)"),
            NormalizedTitle { title: "Doctor Who".to_string(), year: Some(2005) }
        );
    }

    #[test]
    fn test_no_year() {
        assert_eq!(
            normalize_title("Firefly"),
            NormalizedTitle { title: "Firefly".to_string(), year: None }
        );
    }

    #[test]
    fn test_non_numeric_token_keeps_title() {
        let normalized = normalize_title("Show (abc)");
        assert_eq!(normalized.title, "Show (abc)");
        assert_eq!(normalized.year, None);
    }

    #[test]
    fn test_only_first_group_counts() {
        let normalized = normalize_title("Skins (UK) (2007)");
        assert_eq!(normalized.title, "Skins (UK) (2007)");
        assert_eq!(normalized.year, None);

        let normalized = normalize_title("House of Cards (2013) (US)");
        assert_eq!(normalized.title, "House of Cards");
        assert_eq!(normalized.year, Some(2013));
    }

    #[test]
    fn test_oversized_number_is_not_a_year() {
        let normalized = normalize_title("Show (99999999999)");
        assert_eq!(normalized.title, "Show (99999999999)");
        assert_eq!(normalized.year, None);
    }
}
