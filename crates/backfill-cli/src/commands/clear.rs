use super::prompts;
use crate::output::Output;
use backfill_config::{Config, CredentialStore, ImportConfig, PathManager};
use color_eyre::Result;
use std::fs;
use std::path::Path;

pub async fn run_clear(
    all: bool,
    ledger: bool,
    matches: bool,
    credentials: bool,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();

    if !(all || ledger || matches || credentials) {
        output.warn("No clear option specified. Use --ledger, --matches, --credentials, or --all");
        output.println("\nExample: backfill clear --matches");
        return Ok(());
    }

    // The stores may live in a custom storage_dir
    let import = if path_manager.config_file().exists() {
        Config::load_from_file(&path_manager.config_file())
            .map(|c| c.import)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config: {}", e))?
    } else {
        ImportConfig::default()
    };

    if !yes && (all || ledger) {
        let question = "Forget every imported episode? The next import will write them all to Trakt again";
        if !prompts::prompt_yes_no(question, false)? {
            output.info("Nothing cleared");
            return Ok(());
        }
    }

    if all || ledger {
        remove_store(&import.imported_episodes_file(&path_manager), "import ledger", output)?;
    }

    if all || matches {
        remove_store(&import.matched_shows_file(&path_manager), "show choices", output)?;
    }

    if all || credentials {
        clear_credentials(&path_manager, output)?;
    }

    Ok(())
}

fn remove_store(path: &Path, what: &str, output: &Output) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to remove {} at {}: {}", what, path.display(), e))?;
        output.success(format!("Cleared {}: {}", what, path.display()));
    } else {
        output.info(format!("No {} found to clear", what));
    }
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found to clear");
        return Ok(());
    }

    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;

    if !cred_store.has_trakt_tokens() {
        output.info("No Trakt tokens stored");
        return Ok(());
    }

    cred_store.clear_trakt_tokens();
    cred_store.save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", credentials_file.display(), e))?;
    output.success(format!("Cleared Trakt tokens from {}", credentials_file.display()));
    Ok(())
}
