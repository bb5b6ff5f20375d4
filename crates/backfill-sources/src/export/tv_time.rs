use backfill_models::WatchedEpisodeRow;
use chrono::NaiveDateTime;
use csv::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;
use super::{ensure_unique_ids, ExportError};

const REQUIRED_COLUMNS: [&str; 5] = [
    "tv_show_name",
    "episode_id",
    "episode_season_number",
    "episode_number",
    "updated_at",
];

/// Parse `seen_episode.csv` from a TV Time GDPR export.
///
/// TV Time records no show year; `updated_at` (when the episode was ticked
/// off) is used as the watch time.
pub fn parse_tv_time_csv<P: AsRef<Path>>(path: P) -> Result<Vec<WatchedEpisodeRow>, ExportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();
    for column in REQUIRED_COLUMNS {
        if !header_map.contains_key(column) {
            return Err(ExportError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let field = |name: &str| record.get(header_map[name]).unwrap_or("").trim().to_string();

        let show_name = field("tv_show_name");
        let season = parse_number(&show_name, "episode_season_number", &field("episode_season_number"))?;
        let episode = parse_number(&show_name, "episode_number", &field("episode_number"))?;
        let updated_at = field("updated_at");
        let watched_at = if updated_at.is_empty() {
            None
        } else {
            let naive = NaiveDateTime::parse_from_str(&updated_at, "%Y-%m-%d %H:%M:%S").map_err(|_| {
                ExportError::InvalidField {
                    show: show_name.clone(),
                    field: "updated_at",
                    value: updated_at.clone(),
                }
            })?;
            Some(naive.and_utc())
        };

        rows.push(WatchedEpisodeRow {
            episode_id: field("episode_id"),
            show_name,
            show_year: None,
            season,
            episode,
            watched_at,
        });
    }

    ensure_unique_ids(&rows)?;
    debug!(rows = rows.len(), "Parsed TV Time seen_episode.csv");
    Ok(rows)
}

fn parse_number(show: &str, field: &'static str, value: &str) -> Result<u32, ExportError> {
    value.parse::<u32>().map_err(|_| ExportError::InvalidField {
        show: show.to_string(),
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "episode_id,tv_show_name,episode_season_number,episode_number,updated_at,created_at";

    fn create_seen_episode_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_parse_tv_time_csv() {
        let file = create_seen_episode_csv(&[
            "297989,The Americans (2013),1,1,2019-01-05 21:14:03,2019-01-05 21:14:03",
            "297990,The Americans (2013),1,2,2019-01-06 20:00:00,2019-01-06 20:00:00",
        ]);
        let rows = parse_tv_time_csv(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].show_name, "The Americans (2013)");
        assert_eq!(rows[0].episode_id, "297989");
        assert_eq!(rows[0].show_year, None);
        assert_eq!((rows[1].season, rows[1].episode), (1, 2));
        assert_eq!(rows[0].watched_at.unwrap().hour(), 21);
    }

    #[test]
    fn test_duplicate_episode_id_is_fatal() {
        let file = create_seen_episode_csv(&[
            "297989,Firefly,1,1,2019-01-05 21:14:03,",
            "297989,Firefly,1,1,2019-01-05 21:14:03,",
        ]);
        assert!(matches!(
            parse_tv_time_csv(file.path()),
            Err(ExportError::DuplicateEpisodeId(id)) if id == "297989"
        ));
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "episode_id,tv_show_name").unwrap();
        writeln!(file, "1,Firefly").unwrap();
        assert!(matches!(
            parse_tv_time_csv(file.path()),
            Err(ExportError::MissingColumn("episode_season_number"))
        ));
    }
}
