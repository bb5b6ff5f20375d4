use backfill_models::{Episode, Season, ShowCandidate, ShowIds};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use crate::error::SourceError;

pub const API_URL: &str = "https://api.trakt.tv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktIds {
    pub trakt: Option<u64>,
    pub slug: Option<String>,
    pub tvdb: Option<u32>,
    pub imdb: Option<String>,
    pub tmdb: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktShow {
    title: Option<String>,
    year: Option<i32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktSearchResult {
    show: Option<TraktShow>,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    number: u32,
    title: Option<String>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktSeason {
    number: u32,
    #[serde(default)]
    episodes: Option<Vec<TraktEpisode>>,
}

#[derive(Debug, Deserialize, Default)]
struct NotFoundEpisodes {
    #[serde(default)]
    episodes: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    not_found: NotFoundEpisodes,
}

impl From<TraktIds> for ShowIds {
    fn from(ids: TraktIds) -> Self {
        ShowIds {
            trakt: ids.trakt,
            slug: ids.slug,
            tvdb: ids.tvdb,
            // Trakt sometimes includes slashes in IMDB ids
            imdb: ids.imdb.map(|s| s.replace('/', "")),
            tmdb: ids.tmdb,
        }
    }
}

/// Attach the headers every Trakt call needs
fn with_trakt_headers(request: RequestBuilder, access_token: &str, client_id: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id) // Required for authenticated requests
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Content-Type", "application/json")
        .header("Origin", "https://trakt.tv")
        .header("Referer", "https://trakt.tv/")
}

/// Map a non-success status onto the error the import loop understands
pub(crate) async fn check_status(response: Response, what: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, retry_after, what, body))
}

pub(crate) fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    what: &str,
    body: String,
) -> SourceError {
    match status.as_u16() {
        429 => SourceError::RateLimited { retry_after },
        404 => SourceError::NotFound(what.to_string()),
        401 | 403 => SourceError::Unauthorized(format!("{} - {}", what, status)),
        502 | 503 | 504 | 520..=530 => SourceError::Unavailable(status.as_u16()),
        code => SourceError::Api { status: code, body },
    }
}

/// Read the body as JSON. Cloudflare error pages arrive as HTML with a 200,
/// which surfaces here as a decode failure.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(120).collect();
        SourceError::Decode(format!("{} (body starts with: {:?})", e, preview))
    })
}

/// Get encoded username from Trakt API; also proves the token works
pub async fn get_encoded_username(client: &Client, access_token: &str, client_id: &str) -> Result<String, SourceError> {
    let request = client.get(format!("{}/users/me", API_URL));
    let response = with_trakt_headers(request, access_token, client_id).send().await?;
    let response = check_status(response, "user profile").await?;

    let json: serde_json::Value = decode(response).await?;
    let username_slug = json["ids"]["slug"]
        .as_str()
        .ok_or_else(|| SourceError::Decode("Missing username slug".to_string()))?;

    Ok(urlencoding::encode(username_slug).to_string())
}

/// Text search for shows: GET /search/show?query={query}
/// Reference: https://trakt.docs.apiary.io/#reference/search/text-query/get-text-query-results
pub async fn search_shows(
    client: &Client,
    access_token: &str,
    client_id: &str,
    title: &str,
) -> Result<Vec<ShowCandidate>, SourceError> {
    let url = format!("{}/search/show?query={}", API_URL, urlencoding::encode(title));
    let request = client.get(&url);
    let response = with_trakt_headers(request, access_token, client_id).send().await?;
    let response = check_status(response, &format!("search '{}'", title)).await?;

    let results: Vec<TraktSearchResult> = decode(response).await?;
    let candidates = candidates_from(results);

    debug!("Trakt search: '{}' returned {} shows", title, candidates.len());
    Ok(candidates)
}

/// Seasons with their episodes: GET /shows/{id}/seasons?extended=episodes
pub async fn get_seasons(
    client: &Client,
    access_token: &str,
    client_id: &str,
    show: &ShowCandidate,
) -> Result<Vec<Season>, SourceError> {
    let show_id = show
        .ids
        .path_id()
        .ok_or_else(|| SourceError::NotFound(format!("'{}' has no Trakt id", show.title)))?;
    let url = format!(
        "{}/shows/{}/seasons?extended=episodes",
        API_URL,
        urlencoding::encode(&show_id)
    );
    let request = client.get(&url);
    let response = with_trakt_headers(request, access_token, client_id).send().await?;
    let response = check_status(response, &format!("seasons of '{}'", show.title)).await?;

    let seasons: Vec<TraktSeason> = decode(response).await?;
    Ok(seasons_from(seasons))
}

/// Search hits without a show or a title are dropped; provider order is kept.
fn candidates_from(results: Vec<TraktSearchResult>) -> Vec<ShowCandidate> {
    results
        .into_iter()
        .filter_map(|r| r.show)
        .filter_map(|show| {
            let title = show.title?;
            Some(ShowCandidate::new(title, show.year, show.ids.into()))
        })
        .collect()
}

fn seasons_from(seasons: Vec<TraktSeason>) -> Vec<Season> {
    seasons
        .into_iter()
        .map(|season| Season {
            number: season.number,
            episodes: season
                .episodes
                .unwrap_or_default()
                .into_iter()
                .map(|e| Episode {
                    number: e.number,
                    title: e.title,
                    trakt_id: e.ids.trakt,
                })
                .collect(),
        })
        .collect()
}

/// Build the POST /sync/history payload for a single episode
pub(crate) fn history_payload(episode: &Episode, watched_at: Option<DateTime<Utc>>) -> serde_json::Value {
    let mut item = serde_json::json!({
        "ids": {
            "trakt": episode.trakt_id
        }
    });
    // Without watched_at Trakt records the episode as watched "now"
    if let Some(watched_at) = watched_at {
        item["watched_at"] = serde_json::Value::String(watched_at.to_rfc3339());
    }

    serde_json::json!({
        "episodes": [item]
    })
}

/// Add a single episode to the watch history
pub async fn add_episode_to_history(
    client: &Client,
    access_token: &str,
    client_id: &str,
    episode: &Episode,
    watched_at: Option<DateTime<Utc>>,
) -> Result<(), SourceError> {
    if episode.trakt_id.is_none() {
        return Err(SourceError::NotFound(format!("episode {} has no Trakt id", episode.number)));
    }

    let payload = history_payload(episode, watched_at);
    let request = client.post(format!("{}/sync/history", API_URL)).json(&payload);
    let response = with_trakt_headers(request, access_token, client_id).send().await?;
    let response = check_status(response, "add to history").await?;

    let result: HistoryResponse = decode(response).await?;
    if !result.not_found.episodes.is_empty() {
        warn!("Trakt did not recognise episode ids: {:?}", result.not_found.episodes);
        return Err(SourceError::NotFound(format!("episode {}", episode.number)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(5)), "search", String::new()),
            SourceError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(5)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, None, "seasons", String::new()),
            SourceError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None, "search", String::new()),
            SourceError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, None, "search", String::new()),
            SourceError::Unavailable(502)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, None, "history", "bad".to_string()),
            SourceError::Api { status: 422, .. }
        ));
    }

    #[test]
    fn test_history_payload_watched_at_is_optional() {
        let episode = Episode { number: 3, title: None, trakt_id: Some(42) };

        let payload = history_payload(&episode, None);
        assert_eq!(payload["episodes"][0]["ids"]["trakt"], 42);
        assert!(payload["episodes"][0].get("watched_at").is_none());

        let aired = Utc.with_ymd_and_hms(2005, 3, 26, 19, 0, 0).unwrap();
        let payload = history_payload(&episode, Some(aired));
        assert_eq!(payload["episodes"][0]["watched_at"], "2005-03-26T19:00:00+00:00");
    }

    #[test]
    fn test_search_results_map_to_candidates() {
        let json = r#"[
            {"type": "show", "score": 1000, "show": {"title": "Doctor Who", "year": 2005,
                "ids": {"trakt": 56, "slug": "doctor-who-2005", "tvdb": 78804, "imdb": "tt0436992", "tmdb": 57243}}},
            {"type": "show", "score": 950, "show": {"title": null, "year": 2010,
                "ids": {"trakt": 7, "slug": "untitled", "tvdb": null, "imdb": null, "tmdb": null}}},
            {"type": "show", "score": 900, "show": {"title": "Doctor Who", "year": 1963,
                "ids": {"trakt": 1, "slug": "doctor-who", "tvdb": null, "imdb": null, "tmdb": null}}}
        ]"#;
        let results: Vec<TraktSearchResult> = serde_json::from_str(json).unwrap();
        let shows = candidates_from(results);

        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].year, Some(2005));
        assert_eq!(shows[0].ids.slug.as_deref(), Some("doctor-who-2005"));
        assert_eq!(shows[1].link(), "https://trakt.tv/shows/doctor-who");
    }

    #[test]
    fn test_seasons_keep_episode_numbers_and_ids() {
        let json = r#"[
            {"number": 0, "ids": {"trakt": 3}},
            {"number": 1, "ids": {"trakt": 4}, "episodes": [
                {"season": 1, "number": 1, "title": "Rose", "ids": {"trakt": 101, "slug": null}},
                {"season": 1, "number": 3, "title": null, "ids": {"trakt": 103}}
            ]}
        ]"#;
        let seasons = seasons_from(serde_json::from_str(json).unwrap());

        assert_eq!(seasons.len(), 2);
        assert!(seasons[0].episodes.is_empty());
        assert_eq!(seasons[1].number, 1);
        assert_eq!(seasons[1].episodes[0].title.as_deref(), Some("Rose"));
        assert_eq!(seasons[1].episodes[1].number, 3);
        assert_eq!(seasons[1].episodes[1].trakt_id, Some(103));
    }
}
