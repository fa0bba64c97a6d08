//! The slide pipeline: rasterise a deck, then save → analyze → append each
//! slide in order.
//!
//! ```text
//! Init ─▶ Rasterizing ─▶ ( Saving ─▶ Analyzing ─▶ Persisting ─▶ pause )* ─▶ Done
//!                               │           │             │
//!                               └───────────┴─────────────┴──▶ Aborted
//! ```
//!
//! Slides before `start_slide` are skipped without touching the disk. Each
//! processed slide's JPEG is (re)written, and its record is appended only after
//! a complete analysis, so an aborted run never leaves a partial record. The
//! first failure stops the run; the returned error names the slide to resume
//! from.
//!
//! The analysis file is never truncated. Resuming at exactly one past the
//! last appended slide yields a clean file; any other choice appends duplicate
//! records or leaves gaps, and nothing here detects that.

use crate::config::PipelineConfig;
use crate::error::{SlideError, SlidesError};
use crate::pipeline::analyze::{ImageSource, SlideAnalyzer};
use crate::pipeline::encode::{save_jpeg, slide_file_name};
use crate::pipeline::input::deck_stem;
use crate::pipeline::rasterize::{PdfiumRasterizer, SlideImage, SlideRasterizer};
use crate::record::{append_record, SlideRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Output locations derived from the deck's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckPaths {
    pub output_dir: PathBuf,
    /// `{output_dir}/{stem}_slides`
    pub slides_dir: PathBuf,
    /// `{output_dir}/{stem}_analysis.txt`
    pub analysis_file: PathBuf,
}

impl DeckPaths {
    pub fn new(pdf_path: &Path, output_dir: &Path) -> Self {
        let stem = deck_stem(pdf_path);
        Self {
            output_dir: output_dir.to_path_buf(),
            slides_dir: output_dir.join(format!("{stem}_slides")),
            analysis_file: output_dir.join(format!("{stem}_analysis.txt")),
        }
    }

    /// Path of the saved JPEG for 1-based slide `index`.
    pub fn slide_image(&self, index: usize) -> PathBuf {
        self.slides_dir.join(slide_file_name(index))
    }

    /// Create the output and slides directories (idempotent).
    pub fn create_dirs(&self) -> Result<(), SlidesError> {
        for dir in [&self.output_dir, &self.slides_dir] {
            std::fs::create_dir_all(dir).map_err(|source| SlidesError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub pdf_path: PathBuf,
    pub analysis_file: PathBuf,
    pub slides_dir: PathBuf,
    /// Pages in the deck.
    pub total_slides: usize,
    /// Slides saved, analyzed and appended in this run.
    pub processed_slides: usize,
    /// Slides before `start_slide`.
    pub skipped_slides: usize,
    pub duration_ms: u64,
}

/// Drives one deck through the rasteriser and analyzer.
pub struct SlidePipeline<R, A> {
    rasterizer: R,
    analyzer: A,
    config: PipelineConfig,
}

impl<R: SlideRasterizer, A: SlideAnalyzer> SlidePipeline<R, A> {
    pub fn new(rasterizer: R, analyzer: A, config: PipelineConfig) -> Self {
        Self {
            rasterizer,
            analyzer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `pdf_path` from `config.start_slide` to the last slide.
    ///
    /// # Errors
    /// - [`SlidesError::Io`] when the output directories cannot be created
    /// - [`SlidesError::Render`] when the deck cannot be rasterised
    /// - [`SlidesError::SlideFailed`] on the first slide that fails; use
    ///   [`SlidesError::resume_index`] as the next `start_slide`
    pub async fn run(&self, pdf_path: &Path) -> Result<RunReport, SlidesError> {
        let run_start = Instant::now();
        let start_slide = self.config.start_slide;
        let cb = self.config.progress_callback.as_ref();

        // ── Init ─────────────────────────────────────────────────────────
        let paths = DeckPaths::new(pdf_path, &self.config.output_dir);
        paths.create_dirs()?;
        if start_slide == 1 && has_content(&paths.analysis_file) {
            warn!(
                "{} already has records; new records will be appended after them",
                paths.analysis_file.display()
            );
        }

        // ── Rasterizing ──────────────────────────────────────────────────
        info!("Converting PDF: {}", pdf_path.display());
        let slides = self.rasterizer.rasterize(pdf_path).await?;
        let total = slides.len();
        info!("Total slides found: {}", total);
        if let Some(cb) = cb {
            cb.on_run_start(total, start_slide);
        }
        if start_slide > total {
            warn!(
                "Start slide {} is past the last slide ({}); nothing to do",
                start_slide, total
            );
        }

        // ── Per slide ────────────────────────────────────────────────────
        let mut processed = 0;
        for (pos, slide) in slides.into_iter().enumerate() {
            let index = pos + 1;
            if index < start_slide {
                continue;
            }

            info!("Processing slide {}/{}", index, total);
            if let Some(cb) = cb {
                cb.on_slide_start(index, total);
            }

            match self.process_slide(index, &slide, &paths).await {
                Ok(record) => {
                    processed += 1;
                    if let Some(cb) = cb {
                        cb.on_slide_complete(index, total, record.text.len());
                    }
                    if !self.config.pacing.is_zero() {
                        debug!("Pausing {:?} before the next slide", self.config.pacing);
                        tokio::time::sleep(self.config.pacing).await;
                    }
                }
                Err(e) => {
                    error!("Error processing slide {} ({}): {}", index, e.stage(), e);
                    error!(
                        "You can resume from slide {} using --start-slide {}",
                        index, index
                    );
                    if let Some(cb) = cb {
                        cb.on_slide_error(index, total, &e.to_string());
                    }
                    return Err(SlidesError::SlideFailed { index, source: e });
                }
            }
        }

        // ── Done ─────────────────────────────────────────────────────────
        info!(
            "Analysis complete. Output saved to: {}",
            paths.analysis_file.display()
        );
        info!("Slide images saved in: {}", paths.slides_dir.display());
        if let Some(cb) = cb {
            cb.on_run_complete(total, processed);
        }

        Ok(RunReport {
            pdf_path: pdf_path.to_path_buf(),
            analysis_file: paths.analysis_file,
            slides_dir: paths.slides_dir,
            total_slides: total,
            processed_slides: processed,
            skipped_slides: start_slide.saturating_sub(1).min(total),
            duration_ms: run_start.elapsed().as_millis() as u64,
        })
    }

    /// Save, analyze and append one slide.
    async fn process_slide(
        &self,
        index: usize,
        slide: &SlideImage,
        paths: &DeckPaths,
    ) -> Result<SlideRecord, SlideError> {
        let image_path = paths.slide_image(index);
        save_jpeg(&slide.image, &image_path, self.config.jpeg_quality).map_err(|e| {
            SlideError::Save {
                index,
                path: image_path.clone(),
                detail: e.to_string(),
            }
        })?;

        let text = self
            .analyzer
            .analyze(
                &ImageSource::Local(image_path),
                self.config.context.as_deref(),
            )
            .await
            .map_err(|source| SlideError::Analysis { index, source })?;

        let record = SlideRecord::new(index, text);
        append_record(&paths.analysis_file, &record).map_err(|source| SlideError::Persist {
            index,
            path: paths.analysis_file.clone(),
            source,
        })?;
        debug!("Appended slide {} to {}", index, paths.analysis_file.display());

        Ok(record)
    }
}

fn has_content(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Describe every slide of `pdf_path` with PDFium rasterisation and `analyzer`.
///
/// This is the primary entry point for the library.
///
/// ```rust,no_run
/// use deckscribe::{describe_deck, AnalyzerConfig, OpenRouterAnalyzer, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let analyzer = OpenRouterAnalyzer::new(AnalyzerConfig::builder("sk-or-...").build()?)?;
/// let config = PipelineConfig::builder().output_dir("output").build()?;
/// let report = describe_deck("talk.pdf", analyzer, config).await?;
/// println!("{}", report.analysis_file.display());
/// # Ok(())
/// # }
/// ```
pub async fn describe_deck<A: SlideAnalyzer>(
    pdf_path: impl AsRef<Path>,
    analyzer: A,
    config: PipelineConfig,
) -> Result<RunReport, SlidesError> {
    let rasterizer = PdfiumRasterizer::from_config(&config);
    SlidePipeline::new(rasterizer, analyzer, config)
        .run(pdf_path.as_ref())
        .await
}
