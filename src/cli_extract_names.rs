//! extract-names - build a persisted name registry from name lists

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use midi_library::core::registry::read_sources;
use midi_library::NameRegistry;

/// Extract `Name (YYYY-YYYY)` records into a `Slug,DisplayName` CSV table
#[derive(Parser, Debug)]
#[command(name = "extract-names")]
#[command(version)]
struct Args {
    /// Text or PDF files to scan
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Where to write the table
    #[arg(short, long, default_value = "pianists.csv")]
    output: PathBuf,

    /// Command used to turn a PDF into text
    #[arg(long, default_value = "pdftotext")]
    pdftotext: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_target(false)
        .compact()
        .init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let texts = read_sources(&args.sources, &args.pdftotext);
    if texts.is_empty() {
        warn!("None of the {} source(s) could be read", args.sources.len());
    }

    let registry = NameRegistry::extract(texts.iter().map(String::as_str));
    registry
        .save_csv(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        "Extracted {} names into {}",
        registry.len(),
        args.output.display()
    );
    Ok(())
}
