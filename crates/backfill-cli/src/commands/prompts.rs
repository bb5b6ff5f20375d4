use backfill_core::{ImportError, PromptRequest, Prompter, SKIP_TOKEN};
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use dialoguer::{Confirm, Input, Password};
use owo_colors::OwoColorize;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder.interact_text().map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for a secret (masked input)
pub fn prompt_password(prompt: &str, confirm: bool) -> Result<String> {
    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation(format!("Confirm {}", prompt), "Values do not match");
    }
    password
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read secret: {}", e))
}

/// Prompt for yes/no with a default
pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Asks on the terminal which candidate an ambiguous show name means.
#[derive(Default)]
pub struct TerminalPrompter {
    candidate_count: AtomicUsize,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn present(&self, request: &PromptRequest<'_>) {
        self.candidate_count.store(request.candidates.len(), Ordering::SeqCst);

        let year = request
            .year
            .map(|y| format!(" from {}", y))
            .unwrap_or_default();
        println!();
        println!(
            "{} '{}'{} ({}) matches more than one show on Trakt.",
            "?".bright_yellow(),
            request.show_name.bold(),
            year,
            request.context
        );

        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        table.set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("Year").fg(Color::Cyan),
            Cell::new("Seasons").fg(Color::Cyan),
            Cell::new("Link").fg(Color::Cyan),
        ]);
        for (index, candidate) in request.candidates.iter().enumerate() {
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(&candidate.title),
                Cell::new(candidate.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())),
                Cell::new(candidate.seasons.len()),
                Cell::new(candidate.link()),
            ]);
        }
        println!("{}", table);
        println!(
            "Your answer is remembered. Type {} to never import this show.",
            SKIP_TOKEN.bold()
        );
    }

    fn read_selection(&self) -> Result<String, ImportError> {
        let count = self.candidate_count.load(Ordering::SeqCst);
        Input::<String>::new()
            .with_prompt(format!("Which show is it? (1-{} or {})", count, SKIP_TOKEN))
            .allow_empty(true)
            .interact_text()
            .map_err(|e| match e {
                dialoguer::Error::IO(io_err) if io_err.kind() == io::ErrorKind::Interrupted => ImportError::Cancelled,
                other => ImportError::Prompt(other.to_string()),
            })
    }
}
