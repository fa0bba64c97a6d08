//! # deckscribe
//!
//! Turn a slide-deck PDF into plain-text slide descriptions using a vision
//! language model, and rebuild a simple text-only PDF from those descriptions.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck.pdf
//!  │
//!  ├─ 1. Rasterize  every page via pdfium (spawn_blocking)
//!  ├─ 2. Save       output/{stem}_slides/slide_NNN.jpg
//!  ├─ 3. Analyze    one vision-model call per slide, strictly in order
//!  └─ 4. Append     output/{stem}_analysis.txt, one separator block per slide
//!
//! {stem}_analysis.txt ─▶ parse ─▶ one US-Letter page per record ─▶ slides.pdf
//! ```
//!
//! Each record is appended as soon as its slide is analyzed, so a failed run
//! keeps everything before the failure. The error names the slide to resume
//! from; pass it back as `start_slide`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckscribe::{describe_deck, AnalyzerConfig, OpenRouterAnalyzer, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("OPENROUTER_API_KEY")?;
//!     let analyzer = OpenRouterAnalyzer::new(AnalyzerConfig::builder(api_key).build()?)?;
//!     let config = PipelineConfig::builder()
//!         .context("Quarterly engineering review")
//!         .build()?;
//!
//!     match describe_deck("review.pdf", analyzer, config).await {
//!         Ok(report) => println!("{}", report.analysis_file.display()),
//!         Err(e) => {
//!             if let Some(index) = e.resume_index() {
//!                 eprintln!("resume with start_slide = {index}");
//!             }
//!             return Err(e.into());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deckscribe` and `deck2pdf` binaries |
//!
//! ```toml
//! deckscribe = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod deck;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, PipelineConfig, PipelineConfigBuilder};
pub use controller::{describe_deck, DeckPaths, RunReport, SlidePipeline};
pub use deck::{render_analysis_file, render_deck, DeckLayout};
pub use error::{AnalysisError, RenderError, SlideError, SlidesError};
pub use pipeline::analyze::{ImageSource, OpenRouterAnalyzer, ProviderAnalyzer, SlideAnalyzer};
pub use pipeline::rasterize::{PdfiumRasterizer, SlideImage, SlideRasterizer};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use record::{parse_file, parse_records, SlideRecord};
