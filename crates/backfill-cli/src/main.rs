use backfill_config::PathManager;
use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, import};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

/// Exit status after Ctrl-C, as a shell reports SIGINT
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "backfill")]
#[command(about = "Backfill your Trakt watch history from a Twee or TV Time export")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to this file (rotated daily) instead of stderr.
    /// A bare --log-file writes to logs/backfill.log in the config directory
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark every watched episode from an export as watched on Trakt
    #[command(long_about = "Read a Twee JSON backup or a TV Time seen_episode.csv and add each watched episode to your Trakt history. Episodes that were already imported are skipped, and ambiguous show names are asked about once and remembered.")]
    Import {
        /// Export file (defaults to import.default_backup_file from the config)
        #[arg(value_name = "BACKUP_FILE")]
        backup_file: Option<std::path::PathBuf>,

        /// Resolve shows and episodes without writing anything to Trakt
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Export format
        #[arg(long, default_value = "auto", value_enum)]
        format: import::FormatArg,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage the Trakt API application credentials and OAuth tokens. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Remove stored state
    #[command(long_about = "Remove the import ledger, the remembered show choices, or the stored Trakt tokens. Removing the ledger makes the next import write every episode again.")]
    Clear {
        /// Remove everything below
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Forget which episodes were already imported
        #[arg(long, action = ArgAction::SetTrue)]
        ledger: bool,

        /// Forget the answers given for ambiguous show names
        #[arg(long, action = ArgAction::SetTrue)]
        matches: bool,

        /// Remove stored Trakt tokens
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Do not ask for confirmation
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show full configuration including masked secrets
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure Trakt (OAuth flow)
    #[command(long_about = "Configure Trakt API credentials and perform OAuth authentication. You'll need to create a Trakt API application at https://trakt.tv/oauth/applications first.")]
    Trakt {
        /// Trakt Client ID (if not provided, will prompt)
        #[arg(long)]
        client_id: Option<String>,

        /// Trakt Client Secret (if not provided, will prompt)
        #[arg(long)]
        client_secret: Option<String>,
    },
}

fn resolve_log_file(arg: Option<Option<PathBuf>>, paths: &PathManager) -> Option<PathBuf> {
    arg.map(|path| path.unwrap_or_else(|| paths.default_log_file()))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = resolve_log_file(cli.log_file.clone(), &PathManager::default());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    // Prompts block the runtime thread, so the watcher lives on its own task.
    // Every store write is a single rename, so exiting here cannot leave a partial record.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Cancel requested...");
            std::process::exit(EXIT_CANCELLED);
        }
    });

    let result = match cli.command {
        Commands::Import { backup_file, dry_run, format } => {
            import::run_import(backup_file, dry_run, format, &output).await
        }
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear { all, ledger, matches, credentials, yes } => {
            clear::run_clear(all, ledger, matches, credentials, yes, &output).await
        }
    };

    if let Err(report) = &result {
        if matches!(report.downcast_ref::<backfill_core::ImportError>(), Some(backfill_core::ImportError::Cancelled)) {
            output.eprintln("Cancel requested...");
            std::process::exit(EXIT_CANCELLED);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_file_for(args: &[&str]) -> Option<PathBuf> {
        let cli = Cli::try_parse_from(args).unwrap();
        resolve_log_file(cli.log_file, &PathManager::rooted_at(PathBuf::from("/tmp/backfill")))
    }

    #[test]
    fn test_log_file_flag() {
        assert_eq!(log_file_for(&["backfill", "config"]), None);
        assert_eq!(
            log_file_for(&["backfill", "--log-file", "config"]),
            Some(PathBuf::from("/tmp/backfill/logs/backfill.log"))
        );
        assert_eq!(
            log_file_for(&["backfill", "--log-file=/var/log/backfill.log", "config"]),
            Some(PathBuf::from("/var/log/backfill.log"))
        );
    }
}
