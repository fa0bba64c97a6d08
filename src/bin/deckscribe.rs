//! CLI binary for deckscribe.
//!
//! Maps flags to `PipelineConfig` / `AnalyzerConfig` and drives the slide
//! pipeline. A failed slide surfaces as the returned error, which names the
//! `--start-slide` to resume from.

use anyhow::{Context, Result};
use clap::Parser;
use deckscribe::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR};
use deckscribe::{
    AnalyzerConfig, OpenRouterAnalyzer, PdfiumRasterizer, PipelineConfig,
    PipelineProgressCallback, ProgressCallback, ProviderAnalyzer, RunReport, SlideAnalyzer,
    SlidePipeline, SlidesError,
};
use edgequake_llm::ProviderFactory;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per slide.
struct CliProgressCallback {
    bar: ProgressBar,
    slide_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Rasterizing slides…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            slide_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.slide_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_slides: usize, start_slide: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_slides as u64);
        self.bar
            .set_position(start_slide.saturating_sub(1).min(total_slides) as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Analyzing");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Total slides found: {total_slides} (starting at slide {start_slide})"
            ))
        ));
    }

    fn on_slide_start(&self, index: usize, total_slides: usize) {
        if let Ok(mut t) = self.slide_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar
            .set_message(format!("Processing slide {index}/{total_slides}"));
    }

    fn on_slide_complete(&self, index: usize, total_slides: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            index,
            total_slides,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_slide_error(&self, index: usize, total_slides: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total_slides,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.abandon();
    }

    fn on_run_complete(&self, _total_slides: usize, processed: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} slides analyzed",
            green("✔"),
            bold(&processed.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Describe every slide (writes to ./output)
  deckscribe talk.pdf

  # Give the model some context about the deck
  deckscribe talk.pdf --context "Internal onboarding, week one"

  # Resume after a failure on slide 12
  deckscribe talk.pdf --start-slide 12

  # A different OpenRouter model
  deckscribe talk.pdf --model anthropic/claude-3.5-sonnet

  # Use an edgequake-llm provider instead of OpenRouter
  deckscribe talk.pdf --provider openai --model gpt-4.1-mini

  # Rebuild a text-only deck from the analysis
  deck2pdf output/talk_analysis.txt --output talk_text.pdf

OUTPUT:
  {output-dir}/{stem}_analysis.txt       one separator block per slide, appended
  {output-dir}/{stem}_slides/slide_NNN.jpg  rasterized slides

  The analysis file is never truncated. Re-running with the same
  --start-slide appends duplicate records; delete the file to start over.

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY   API key for the default OpenRouter analyzer
  PDFIUM_LIB_PATH      libpdfium file or the directory holding it
  RUST_LOG             Override log filtering (e.g. deckscribe=debug)
"#;

/// Describe slide-deck PDFs slide by slide with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "deckscribe",
    version,
    about = "Describe each slide of a PDF deck with a vision model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the slide-deck PDF.
    pdf_path: PathBuf,

    /// Extra context appended to every slide prompt.
    #[arg(long)]
    context: Option<String>,

    /// Directory for the analysis file and slide images.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// 1-based slide to start (or resume) from.
    #[arg(long, default_value_t = 1,
          value_parser = clap::value_parser!(u64).range(1..))]
    start_slide: u64,

    /// Vision model ID. Defaults to the OpenRouter model; required with
    /// --provider.
    #[arg(long)]
    model: Option<String>,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Use an edgequake-llm provider (openai, anthropic, gemini, ollama, …)
    /// instead of OpenRouter. Its API key is read from the provider's own
    /// environment variable.
    #[arg(long)]
    provider: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Pause between slides, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pacing_ms: u64,

    /// libpdfium file or directory; system library when unset.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is drawn.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let model = resolve_model(cli.model.as_deref(), cli.provider.as_deref())?;
    let result = if let Some(ref provider_name) = cli.provider {
        let provider = ProviderFactory::create_llm_provider(provider_name, &model)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Failed to configure provider '{provider_name}'"))?;
        run(&cli, ProviderAnalyzer::new(provider), config).await
    } else {
        let api_key = cli.api_key.clone().unwrap_or_default();
        let analyzer_config = AnalyzerConfig::builder(api_key)
            .base_url(cli.base_url.clone())
            .model(model)
            .build()
            .context("Invalid analyzer configuration")?;
        let analyzer =
            OpenRouterAnalyzer::new(analyzer_config).context("Failed to create HTTP client")?;
        run(&cli, analyzer, config).await
    };

    // A slide failure already carries the resume hint in its Display.
    let report = result.context("Slide analysis failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "Analysis complete. Output saved to: {}",
            bold(&report.analysis_file.display().to_string())
        );
        eprintln!(
            "Slide images saved in: {}",
            report.slides_dir.display()
        );
        eprintln!(
            "   {} processed  /  {} skipped  ·  {}ms total",
            dim(&report.processed_slides.to_string()),
            dim(&report.skipped_slides.to_string()),
            report.duration_ms,
        );
    }

    Ok(())
}

async fn run<A: SlideAnalyzer>(
    cli: &Cli,
    analyzer: A,
    config: PipelineConfig,
) -> Result<RunReport, SlidesError> {
    let rasterizer = PdfiumRasterizer::from_config(&config);
    SlidePipeline::new(rasterizer, analyzer, config)
        .run(&cli.pdf_path)
        .await
}

/// Pick the model ID. The built-in default is an OpenRouter ID, so a
/// provider other than OpenRouter needs an explicit `--model`.
fn resolve_model(model: Option<&str>, provider: Option<&str>) -> Result<String> {
    match (model, provider) {
        (Some(m), _) if !m.trim().is_empty() => Ok(m.to_string()),
        (_, Some(p)) => anyhow::bail!(
            "--provider {p} needs an explicit --model; \
             the default '{DEFAULT_MODEL}' is an OpenRouter model ID"
        ),
        (Some(_), None) => anyhow::bail!("--model must not be empty"),
        (None, None) => Ok(DEFAULT_MODEL.to_string()),
    }
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .dpi(cli.dpi)
        .pacing_ms(cli.pacing_ms)
        .start_slide(usize::try_from(cli.start_slide).context("--start-slide is too large")?)
        .output_dir(cli.output_dir.clone());

    if let Some(ref context) = cli.context {
        builder = builder.context(context.clone());
    }
    if let Some(lib) = pdfium_locate::discover_pdfium_library(cli.pdfium_lib.as_deref()) {
        builder = builder.pdfium_library(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openrouter_uses_default_model() {
        assert_eq!(resolve_model(None, None).unwrap(), DEFAULT_MODEL);
    }

    #[test]
    fn explicit_model_wins() {
        assert_eq!(
            resolve_model(Some("anthropic/claude-3.5-sonnet"), None).unwrap(),
            "anthropic/claude-3.5-sonnet"
        );
        assert_eq!(
            resolve_model(Some("gpt-4.1-mini"), Some("openai")).unwrap(),
            "gpt-4.1-mini"
        );
    }

    #[test]
    fn provider_without_model_is_rejected() {
        let err = resolve_model(None, Some("anthropic")).unwrap_err().to_string();
        assert!(err.contains("--provider anthropic"), "got: {err}");
        assert!(err.contains("--model"), "got: {err}");
    }

    #[test]
    fn blank_model_is_rejected() {
        assert!(resolve_model(Some("  "), None).is_err());
        assert!(resolve_model(Some(""), Some("openai")).is_err());
    }

    #[test]
    fn cli_accepts_provider_with_model() {
        let cli = Cli::try_parse_from([
            "deckscribe", "talk.pdf", "--provider", "openai", "--model", "gpt-4.1-mini",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("openai"));
        assert_eq!(
            resolve_model(cli.model.as_deref(), cli.provider.as_deref()).unwrap(),
            "gpt-4.1-mini"
        );
    }
}
