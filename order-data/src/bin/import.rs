use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use order_core::payload::{assign_missing_ids, to_payload};
use order_data::OrderImporter;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build an order payload from a CSV list of articles.
///
/// The CSV file should have the following columns:
/// - merchant: Shop the article is ordered from (one task per merchant)
/// - link: Link or article number
/// - properties: Size, colour, etc. (optional)
/// - quantity: Number of items (optional, defaults to 1)
/// - price: Unit price, e.g. 19.99 or "19,99" (optional, defaults to 0)
#[derive(Parser, Debug)]
#[command(name = "order-import")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing the articles
    #[arg(short, long)]
    file: PathBuf,

    /// Write the payload here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Give every task a fresh id
    #[arg(short, long, default_value_t = false)]
    assign_ids: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = OrderImporter::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    let mut order =
        OrderImporter::into_order(&records).context("Failed to group articles into tasks")?;

    if args.assign_ids {
        assign_missing_ids(&mut order);
    }

    info!(
        articles = records.len(),
        tasks = order.tasks.len(),
        "imported articles"
    );

    let payload = to_payload(&order).context("Failed to serialize order")?;

    match &args.output {
        Some(path) => fs::write(path, payload)
            .with_context(|| format!("Failed to write: {}", path.display()))?,
        None => println!("{payload}"),
    }

    Ok(())
}
