use super::prompts;
use crate::output::{Output, OutputFormat};
use backfill_config::{Config, CredentialStore, PathManager, TraktConfig};
use backfill_core::{JsonDisambiguationStore, JsonImportLedger};
use backfill_sources::trakt_authenticate;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output).await,
        crate::ConfigCommands::Trakt { client_id, client_secret } => configure_trakt(client_id, client_secret, output).await,
    }
}

fn styled_table(header: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(header).fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold)
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

async fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Configuration will be created when you run 'backfill config trakt'.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;
    let token_expires = cred_store.get_trakt_token_expires();

    let matches = JsonDisambiguationStore::open(config.import.matched_shows_file(&path_manager));
    let ledger = JsonImportLedger::open(config.import.imported_episodes_file(&path_manager));
    // A corrupt ledger is reported, not fatal, when only displaying settings
    let imported = ledger.len().map(|n| n.to_string()).unwrap_or_else(|e| format!("unreadable: {}", e));

    let (client_id, client_secret) = match &config.trakt {
        Some(trakt) if full => (trakt.client_id.clone(), trakt.client_secret.clone()),
        Some(trakt) => (mask_string(&trakt.client_id), mask_string(&trakt.client_secret)),
        None => ("<not set>".to_string(), "<not set>".to_string()),
    };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            let mut files = styled_table("Files");
            files.add_row(vec![Cell::new("Config"), Cell::new(config_file.display())]);
            files.add_row(vec![Cell::new("Credentials"), Cell::new(cred_store.path().display())]);
            files.add_row(vec![Cell::new("Show choices"), Cell::new(matches.path().display())]);
            files.add_row(vec![Cell::new("Import ledger"), Cell::new(ledger.path().display())]);
            println!("{}", files);
            println!();

            let mut trakt = styled_table("Trakt");
            trakt.add_row(vec![Cell::new("Client ID"), Cell::new(client_id)]);
            trakt.add_row(vec![Cell::new("Client Secret"), Cell::new(client_secret)]);
            trakt.add_row(vec![
                Cell::new("Authenticated"),
                Cell::new(match token_expires {
                    Some(expires) => format!("{} (token expires {})", "✓".green(), expires.to_rfc3339()),
                    None => "✗".red().to_string(),
                }),
            ]);
            println!("{}", trakt);
            println!();

            let mut import = styled_table("Import");
            import.add_row(vec![Cell::new("Default backup file"), Cell::new(config.import.default_backup_file.display())]);
            import.add_row(vec![Cell::new("Request spacing"), Cell::new(format!("{} ms", config.import.request_spacing_ms))]);
            import.add_row(vec![Cell::new("Rate limit cooldown"), Cell::new(format!("{} s", config.import.rate_limit_cooldown_seconds))]);
            import.add_row(vec![Cell::new("Max error streak"), Cell::new(config.import.max_error_streak)]);
            import.add_row(vec![Cell::new("Episodes imported"), Cell::new(imported)]);
            println!("{}", import);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "credentials_file": cred_store.path().display().to_string(),
                "trakt": {
                    "client_id": client_id,
                    "client_secret": client_secret,
                    "authenticated": token_expires.is_some(),
                    "token_expires": token_expires.map(|t| t.to_rfc3339()),
                },
                "import": {
                    "default_backup_file": config.import.default_backup_file.display().to_string(),
                    "request_spacing_ms": config.import.request_spacing_ms,
                    "rate_limit_cooldown_seconds": config.import.rate_limit_cooldown_seconds,
                    "max_error_streak": config.import.max_error_streak,
                    "matched_shows_file": matches.path().display().to_string(),
                    "imported_episodes_file": ledger.path().display().to_string(),
                    "episodes_imported": imported,
                }
            }));
        }
    }

    Ok(())
}

async fn configure_trakt(client_id_arg: Option<String>, client_secret_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager.ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    } else {
        output.info("Configuration file not found. Creating default configuration...");
        Config::default()
    };

    print_section_header("Trakt API Setup", output);
    output.println("");
    output.println("Follow the instructions to setup your Trakt API application:");
    print_instruction_list(&[
        "Login to Trakt and navigate to your API apps page: https://trakt.tv/oauth/applications",
        "Create a new API application named 'Backfill'",
        "Use 'urn:ietf:wg:oauth:2.0:oob' as the Redirect URI",
    ], output);
    output.println("");

    let existing = config.trakt.clone().filter(|_| config.is_trakt_configured());

    let client_id = match client_id_arg {
        Some(id) => id,
        None => loop {
            let default = existing.as_ref().map(|t| t.client_id.as_str());
            let input = prompts::prompt_string("Trakt Client ID", default)?;
            match validate_client_id(input.trim()) {
                Ok(()) => break input.trim().to_string(),
                Err(e) => {
                    output.error(format!("Validation error: {}", e));
                    output.info("You can find your Client ID at: https://trakt.tv/oauth/applications");
                }
            }
        },
    };

    let client_secret = match client_secret_arg {
        Some(secret) => secret,
        None => loop {
            let input = prompts::prompt_password("Trakt Client Secret", existing.is_none())?;
            if !input.trim().is_empty() {
                break input.trim().to_string();
            }
            output.error("Validation error: Client Secret cannot be empty");
        },
    };

    config.trakt = Some(TraktConfig {
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
    });
    config.save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    // New client credentials invalidate the old refresh token
    let refresh_token = if existing.as_ref().map(|t| t.client_id == client_id).unwrap_or(false) {
        cred_store.get_trakt_refresh_token().cloned()
    } else {
        None
    };

    output.println("");
    print_oauth_progress("Starting Trakt OAuth authentication...", output);
    let token_info = trakt_authenticate(&client_id, &client_secret, refresh_token.as_deref(), |url| {
        output.println("");
        output.println("Please visit the following URL to authorize this application:");
        output.println(format!("  {}", url.bright_blue()));
        output.println("");
        prompts::prompt_string("Authorization code", None).map_err(|e| anyhow::anyhow!("{}", e))
    })
    .await
    .map_err(|e| color_eyre::eyre::eyre!("Trakt OAuth authentication failed: {}", e))?;
    print_oauth_progress("Authentication successful! Saving credentials...", output);

    let expires_at = token_info.expires_at;
    cred_store.set_trakt_access_token(token_info.access_token);
    cred_store.set_trakt_refresh_token(token_info.refresh_token);
    cred_store.set_trakt_token_expires(expires_at);
    cred_store.save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", credentials_file.display(), e))?;

    output.println("");
    output.success("Trakt authentication successful!");
    output.println(format!("  Access token expires at: {}", expires_at.to_rfc3339().bright_green()));

    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_CLIENT_ID" || s == "YOUR_CLIENT_SECRET" {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

/// Validates Trakt Client ID format
fn validate_client_id(input: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err("Client ID cannot be empty");
    }
    if input.len() < 10 {
        return Err("Client ID seems too short. Please verify it's correct.");
    }
    Ok(())
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.println(format!("  {}. {}", idx + 1, item));
    }
}

fn print_oauth_progress(message: &str, output: &Output) {
    output.println(format!("{} {}", "→".bright_blue(), message.bright_white()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("YOUR_CLIENT_ID"), "<not set>");
        assert_eq!(mask_string("abc"), "***");
        assert_eq!(mask_string("abcdef123456"), "ab***56");
    }

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("").is_err());
        assert!(validate_client_id("short").is_err());
        assert!(validate_client_id("0123456789abcdef").is_ok());
    }
}
