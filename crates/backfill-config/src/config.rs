use crate::paths::PathManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID";
const PLACEHOLDER_CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trakt: Option<TraktConfig>,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// Knobs for the episode import loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Minimum spacing between calls to the Trakt API
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,

    /// Wait applied after a rate-limit or transient failure before retrying the same row
    #[serde(default = "default_rate_limit_cooldown_seconds")]
    pub rate_limit_cooldown_seconds: u64,

    /// A row is abandoned once the consecutive failure streak exceeds this
    #[serde(default = "default_max_error_streak")]
    pub max_error_streak: u32,

    /// Export read when no path is given on the command line
    #[serde(default = "default_backup_file")]
    pub default_backup_file: PathBuf,

    /// Directory holding matched_shows.json and imported_episodes.json.
    /// Defaults to the data directory of the PathManager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_request_spacing_ms() -> u64 {
    1000
}

fn default_rate_limit_cooldown_seconds() -> u64 {
    60
}

fn default_max_error_streak() -> u32 {
    10
}

fn default_backup_file() -> PathBuf {
    PathBuf::from("twee.json")
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            request_spacing_ms: default_request_spacing_ms(),
            rate_limit_cooldown_seconds: default_rate_limit_cooldown_seconds(),
            max_error_streak: default_max_error_streak(),
            default_backup_file: default_backup_file(),
            storage_dir: None,
        }
    }
}

impl ImportConfig {
    pub fn matched_shows_file(&self, paths: &PathManager) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => dir.join("matched_shows.json"),
            None => paths.matched_shows_file(),
        }
    }

    pub fn imported_episodes_file(&self, paths: &PathManager) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => dir.join("imported_episodes.json"),
            None => paths.imported_episodes_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trakt: Some(TraktConfig {
                client_id: PLACEHOLDER_CLIENT_ID.to_string(),
                client_secret: PLACEHOLDER_CLIENT_SECRET.to_string(),
            }),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let trakt = self.trakt.as_ref()
            .ok_or_else(|| anyhow::anyhow!("Trakt is not configured. Run 'backfill config trakt' first"))?;
        if trakt.client_id.is_empty() || trakt.client_id == PLACEHOLDER_CLIENT_ID {
            return Err(anyhow::anyhow!("Trakt client_id is not configured"));
        }
        if trakt.client_secret.is_empty() || trakt.client_secret == PLACEHOLDER_CLIENT_SECRET {
            return Err(anyhow::anyhow!("Trakt client_secret is not configured"));
        }

        if self.import.max_error_streak == 0 {
            return Err(anyhow::anyhow!("import.max_error_streak must be at least 1"));
        }

        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        self.validate().is_ok()
    }
}
