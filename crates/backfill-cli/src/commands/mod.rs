pub mod clear;
pub mod config;
pub mod import;
pub mod prompts;

use backfill_config::{Config, PathManager};
use color_eyre::Result;

/// Load config.toml, pointing at `backfill config trakt` when it is missing.
pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        return Err(color_eyre::eyre::eyre!(
            "Configuration file not found at {}. Run 'backfill config trakt' first",
            config_file.display()
        ));
    }
    Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))
}
