use serde::{Deserialize, Serialize};

const TRAKT_WEB_URL: &str = "https://trakt.tv";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u32>,
}

impl ShowIds {
    /// Identifier usable in `/shows/{id}` paths: slug first, then the numeric id.
    pub fn path_id(&self) -> Option<String> {
        self.slug
            .clone()
            .or_else(|| self.trakt.map(|id| id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.number == number)
    }
}

/// A show returned by the target catalog's search.
///
/// `seasons` is empty until the catalog has been asked for them; search
/// results do not carry the episode listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowCandidate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub ids: ShowIds,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

impl ShowCandidate {
    pub fn new(title: impl Into<String>, year: Option<i32>, ids: ShowIds) -> Self {
        Self {
            title: title.into(),
            year,
            ids,
            seasons: Vec::new(),
        }
    }

    pub fn season(&self, number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.number == number)
    }

    /// Season `season`, episode `episode`, matched on their numbers rather than positions.
    pub fn find_episode(&self, season: u32, episode: u32) -> Option<&Episode> {
        self.season(season).and_then(|s| s.episode(episode))
    }

    /// Catalog page for the show, e.g. `https://trakt.tv/shows/doctor-who-2005`.
    pub fn link(&self) -> String {
        match self.ids.path_id() {
            Some(id) => format!("{}/shows/{}", TRAKT_WEB_URL, id),
            None => format!("{}/search?query={}", TRAKT_WEB_URL, urlencoding::encode(&self.title)),
        }
    }

    /// Deep link to a single episode page, used when the catalog lacks the episode.
    /// Without an id there is no show page, so the search link is returned as is.
    pub fn episode_link(&self, season: u32, episode: u32) -> String {
        match self.ids.path_id() {
            Some(_) => format!("{}/seasons/{}/episodes/{}", self.link(), season, episode),
            None => self.link(),
        }
    }

    /// Cache key for per-run bookkeeping (catalog id when known, title otherwise).
    pub fn cache_key(&self) -> String {
        self.ids
            .path_id()
            .unwrap_or_else(|| format!("{} ({:?})", self.title, self.year))
    }
}
