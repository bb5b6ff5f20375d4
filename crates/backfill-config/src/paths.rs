use anyhow::Result;
use std::path::PathBuf;

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("BACKFILL_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("trakt-backfill");

        Ok(Self::rooted_at(base_dir))
    }

    /// Config files directly under `base`, stores and logs in subdirectories.
    pub fn rooted_at(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_docker_env() -> Self {
        Self::rooted_at(container_base_path())
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    /// Human decisions for ambiguous show names.
    pub fn matched_shows_file(&self) -> PathBuf {
        self.data_dir.join("matched_shows.json")
    }

    /// Episodes already written to Trakt.
    pub fn imported_episodes_file(&self) -> PathBuf {
        self.data_dir.join("imported_episodes.json")
    }

    /// Used by a bare `--log-file`.
    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join("backfill.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory, so its presence means we run in Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        // Otherwise ~/.config/trakt-backfill on Linux
        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}
