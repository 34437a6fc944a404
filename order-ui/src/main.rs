use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use order_ui::{AppConfig, FormSession, LoggingConfig, logging};
use tracing::{debug, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned plain-text summary.
    Text,
    /// The complete HTML form.
    Html,
    /// The submit payload, with task ids assigned.
    Payload,
}

/// Shows the totals of an order payload, renders it as a form, or prepares
/// it for submission.
#[derive(Debug, Parser)]
#[command(name = "order-form", version)]
struct Cli {
    /// Order payload (JSON) to load.
    #[arg(long)]
    payload: PathBuf,

    /// Configuration file (TOML). Defaults apply when it does not exist.
    #[arg(long, default_value = "order-form.toml")]
    config: PathBuf,

    /// What to print.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Reshipping fee as typed into the form, e.g. `7,50`. Only counts when
    /// it is above the otherwise applicable fee.
    #[arg(long)]
    reshipping_entry: Option<String>,

    /// Log level or filter directive, overriding the config.
    #[arg(long)]
    log_level: Option<String>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(&LoggingConfig::default()).context("Failed to initialize logging")?;

    let config = AppConfig::load_or_default(Some(cli.config.as_path()))
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    logging::init_logging(&config.logging).context("Failed to apply logging config")?;
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }

    let payload = fs::read_to_string(&cli.payload)
        .with_context(|| format!("Failed to read: {}", cli.payload.display()))?;

    let mut session = FormSession::new(config)?;
    session
        .load_payload(&payload)
        .with_context(|| format!("Failed to load order: {}", cli.payload.display()))?;

    if let Some(entry) = &cli.reshipping_entry {
        session.set_reshipping_entry(entry)?;
        if session.editor().manual_reshipping_fee().is_none() {
            warn!(entry = %entry, "ignoring reshipping entry");
        }
    }

    debug!(format = ?cli.format, "rendering");
    match cli.format {
        OutputFormat::Text => print!("{}", session.summary_text()),
        OutputFormat::Html => println!("{}", session.form_html()),
        OutputFormat::Payload => println!("{}", session.submit_payload()?),
    }

    Ok(())
}
