use backfill_models::WatchedEpisodeRow;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use super::{ensure_unique_ids, parse_timestamp, ExportError};

#[derive(Debug, Deserialize)]
struct TweeProfile {
    #[serde(rename = "Shows", default)]
    shows: Vec<TweeShow>,
}

#[derive(Debug, Deserialize)]
struct TweeShow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "SeriesId", deserialize_with = "string_or_number")]
    series_id: String,
    #[serde(rename = "FirstAired", default)]
    first_aired: Option<String>,
    #[serde(rename = "Episodes", default)]
    episodes: Vec<TweeEpisode>,
}

#[derive(Debug, Deserialize)]
struct TweeEpisode {
    #[serde(rename = "Season", deserialize_with = "string_or_number")]
    season: String,
    #[serde(rename = "Episode", deserialize_with = "string_or_number")]
    episode: String,
    #[serde(rename = "EpisodeId", deserialize_with = "string_or_number")]
    episode_id: String,
    #[serde(rename = "Watched", deserialize_with = "string_or_number")]
    watched: String,
    #[serde(rename = "Aired", default)]
    aired: Option<String>,
}

// Twee writes ids as strings, but hand-edited backups sometimes carry bare numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

/// Parse a Twee JSON backup into watched rows.
///
/// Twee's own episode ids repeat across shows, so the row id is built as
/// `{season}-{episode}-{series id}-{episode id}`.
pub fn parse_twee_backup(content: &str) -> Result<Vec<WatchedEpisodeRow>, ExportError> {
    let profiles: Vec<TweeProfile> = serde_json::from_str(content)?;
    let mut rows = Vec::new();
    let mut unwatched = 0usize;

    for profile in profiles {
        for show in profile.shows {
            let show_year = first_aired_year(&show)?;

            for episode in &show.episodes {
                if episode.watched != "1" {
                    unwatched += 1;
                    continue;
                }

                let episode_id = format!(
                    "{}-{}-{}-{}",
                    episode.season, episode.episode, show.series_id, episode.episode_id
                );
                let season = parse_number(&show.name, "Season", &episode.season)?;
                let number = parse_number(&show.name, "Episode", &episode.episode)?;
                let watched_at = match episode.aired.as_deref().map(str::trim) {
                    Some(aired) if !aired.is_empty() => Some(parse_timestamp(aired).ok_or_else(|| {
                        ExportError::InvalidField {
                            show: show.name.clone(),
                            field: "Aired",
                            value: aired.to_string(),
                        }
                    })?),
                    _ => None,
                };

                rows.push(WatchedEpisodeRow {
                    show_name: show.name.clone(),
                    show_year,
                    episode_id,
                    season,
                    episode: number,
                    watched_at,
                });
            }
        }
    }

    ensure_unique_ids(&rows)?;
    debug!(rows = rows.len(), unwatched, "Parsed Twee backup");
    Ok(rows)
}

fn first_aired_year(show: &TweeShow) -> Result<Option<i32>, ExportError> {
    let first_aired = match show.first_aired.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };
    let year = first_aired.split('-').next().unwrap_or(first_aired);
    year.parse::<i32>()
        .map(Some)
        .map_err(|_| ExportError::InvalidField {
            show: show.name.clone(),
            field: "FirstAired",
            value: first_aired.to_string(),
        })
}

fn parse_number(show: &str, field: &'static str, value: &str) -> Result<u32, ExportError> {
    value.trim().parse::<u32>().map_err(|_| ExportError::InvalidField {
        show: show.to_string(),
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup(episodes: &str) -> String {
        format!(
            r#"[{{"Shows": [
                {{"Name": "Doctor Who (2005)", "SeriesId": "78804", "FirstAired": "2005-03-26", "Episodes": [{}]}},
                {{"Name": "Firefly", "SeriesId": 78874, "FirstAired": "", "Episodes": [
                    {{"Season": "1", "Episode": "1", "EpisodeId": "297989", "Watched": "1", "Aired": ""}}
                ]}}
            ]}}]"#,
            episodes
        )
    }

    #[test]
    fn test_parse_twee_backup() {
        let content = backup(
            r#"{"Season": "1", "Episode": "1", "EpisodeId": "1", "Watched": "1", "Aired": "2005-03-26"},
               {"Season": "1", "Episode": "2", "EpisodeId": "2", "Watched": "0", "Aired": "2005-04-02"}"#,
        );
        let rows = parse_twee_backup(&content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].show_name, "Doctor Who (2005)");
        assert_eq!(rows[0].show_year, Some(2005));
        assert_eq!(rows[0].episode_id, "1-1-78804-1");
        assert_eq!((rows[0].season, rows[0].episode), (1, 1));
        assert!(rows[0].watched_at.is_some());

        assert_eq!(rows[1].show_name, "Firefly");
        assert_eq!(rows[1].show_year, None);
        assert_eq!(rows[1].episode_id, "1-1-78874-297989");
        assert!(rows[1].watched_at.is_none());
    }

    #[test]
    fn test_duplicate_episode_id_is_fatal() {
        let content = backup(
            r#"{"Season": "1", "Episode": "1", "EpisodeId": "1", "Watched": "1", "Aired": ""},
               {"Season": "1", "Episode": "1", "EpisodeId": "1", "Watched": "1", "Aired": ""}"#,
        );
        match parse_twee_backup(&content) {
            Err(ExportError::DuplicateEpisodeId(id)) => assert_eq!(id, "1-1-78804-1"),
            other => panic!("expected duplicate id error, got {:?}", other),
        }
    }

    #[test]
    fn test_unwatched_duplicates_are_ignored() {
        let content = backup(
            r#"{"Season": "1", "Episode": "1", "EpisodeId": "1", "Watched": "1", "Aired": ""},
               {"Season": "1", "Episode": "1", "EpisodeId": "1", "Watched": "0", "Aired": ""}"#,
        );
        assert_eq!(parse_twee_backup(&content).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_season_is_reported() {
        let content = backup(r#"{"Season": "one", "Episode": "1", "EpisodeId": "1", "Watched": "1"}"#);
        match parse_twee_backup(&content) {
            Err(ExportError::InvalidField { field, value, .. }) => {
                assert_eq!(field, "Season");
                assert_eq!(value, "one");
            }
            other => panic!("expected invalid field error, got {:?}", other),
        }
    }
}
