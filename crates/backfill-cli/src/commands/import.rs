use super::{load_config, prompts};
use crate::output::Output;
use backfill_config::{CredentialStore, PathManager};
use backfill_core::{ImportDriver, ImportSettings, JsonDisambiguationStore, JsonImportLedger};
use backfill_sources::{read_export, ExportFormat, TraktClient};
use clap::ValueEnum;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// `.csv` files are TV Time, everything else Twee
    Auto,
    Twee,
    #[value(name = "tv-time")]
    TvTime,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => ExportFormat::Auto,
            FormatArg::Twee => ExportFormat::Twee,
            FormatArg::TvTime => ExportFormat::TvTime,
        }
    }
}

pub async fn run_import(
    backup_file: Option<PathBuf>,
    dry_run: bool,
    format: FormatArg,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    config
        .validate()
        .map_err(|e| eyre!("{}. Run 'backfill config trakt' to set it up", e))?;

    let backup_file = backup_file.unwrap_or_else(|| config.import.default_backup_file.clone());
    if !backup_file.exists() {
        return Err(eyre!(
            "Export file not found at {}. Pass the path to your backup as an argument",
            backup_file.display()
        ));
    }

    // A duplicate episode id stops everything here, before any write
    let rows = read_export(&backup_file, format.into())
        .wrap_err_with(|| format!("Failed to read {}", backup_file.display()))?;

    let trakt = config
        .trakt
        .as_ref()
        .ok_or_else(|| eyre!("Trakt is not configured. Run 'backfill config trakt' first"))?;
    let mut client = TraktClient::new(trakt.client_id.clone(), trakt.client_secret.clone());
    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    client
        .authenticate(&mut cred_store, |url| {
            println!("\nPlease visit the following URL to authorize this application:");
            println!("{}\n", url.bright_blue());
            prompts::prompt_string("Authorization code", None).map_err(|e| anyhow::anyhow!("{}", e))
        })
        .await
        .map_err(|e| eyre!("Trakt authentication failed: {}", e))?;
    info!(user = client.username().unwrap_or("unknown"), "Importing into Trakt account");

    let decisions = JsonDisambiguationStore::open(config.import.matched_shows_file(&path_manager));
    let ledger = JsonImportLedger::open(config.import.imported_episodes_file(&path_manager));
    info!(
        matches = %decisions.path().display(),
        ledger = %ledger.path().display(),
        "Using stores"
    );

    if dry_run {
        output.info("Dry run: shows and episodes are matched, nothing is written to Trakt");
    }

    let prompter = prompts::TerminalPrompter::new();
    let settings = ImportSettings::from_config(&config.import, dry_run);
    let driver = ImportDriver::new(&client, &decisions, &ledger, &prompter, settings);

    let summary = driver.run(&rows).await?;
    output.summary(&summary);

    Ok(())
}
