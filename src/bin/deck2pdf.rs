//! CLI binary that rebuilds a text-only PDF deck from an analysis file.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Convert analysis text to PDF slides.
#[derive(Parser, Debug)]
#[command(
    name = "deck2pdf",
    version,
    about = "Convert a deckscribe analysis file to PDF slides, one page per slide",
    arg_required_else_help = true
)]
struct Cli {
    /// Path to the analysis text file.
    input_file: PathBuf,

    /// Output PDF path.
    #[arg(long, default_value = "output_slides.pdf")]
    output: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    deckscribe::render_analysis_file(&cli.input_file, &cli.output).with_context(|| {
        format!(
            "Failed to build {} from {}",
            cli.output.display(),
            cli.input_file.display()
        )
    })?;

    println!("Created PDF presentation at: {}", cli.output.display());
    Ok(())
}
