//! PDF rasterisation: render every page of a deck to a `DynamicImage`.
//!
//! The controller depends on the [`SlideRasterizer`] trait, not on PDFium, so
//! a run can be driven by synthetic images in tests.
//!
//! [`PdfiumRasterizer`] does the real work inside `spawn_blocking`:
//! `pdfium-render` wraps a C++ library with thread-local state that must not
//! run on a Tokio worker thread.

use crate::config::PipelineConfig;
use crate::error::RenderError;
use crate::pipeline::input::validate_pdf;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rasterised page, tagged with its 1-based position in the deck.
#[derive(Debug, Clone)]
pub struct SlideImage {
    pub index: usize,
    pub image: DynamicImage,
}

/// Turns a PDF into its ordered page images.
pub trait SlideRasterizer: Send + Sync {
    /// Rasterise every page of `pdf_path`, in page order, one entry per page.
    fn rasterize(
        &self,
        pdf_path: &Path,
    ) -> impl Future<Output = Result<Vec<SlideImage>, RenderError>> + Send;
}

/// PDFium-backed rasteriser.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    dpi: u32,
    max_rendered_pixels: u32,
    library: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// `library` of `None` binds the system PDFium.
    pub fn new(dpi: u32, max_rendered_pixels: u32, library: Option<PathBuf>) -> Self {
        Self {
            dpi,
            max_rendered_pixels,
            library,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.dpi,
            config.max_rendered_pixels,
            config.pdfium_library.clone(),
        )
    }

    /// Scale factor from PDF points (1/72 in) to pixels at the configured DPI.
    pub fn scale_factor(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

impl SlideRasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf_path: &Path) -> Result<Vec<SlideImage>, RenderError> {
        validate_pdf(pdf_path)?;

        let path = pdf_path.to_path_buf();
        let scale = self.scale_factor();
        let max_pixels = self.max_rendered_pixels;
        let library = self.library.clone();

        tokio::task::spawn_blocking(move || {
            rasterize_blocking(&path, scale, max_pixels, library.as_deref())
        })
        .await
        .map_err(|e| RenderError::TaskFailed(e.to_string()))?
    }
}

/// Blocking implementation of page rendering.
fn rasterize_blocking(
    pdf_path: &Path,
    scale: f32,
    max_pixels: u32,
    library: Option<&Path>,
) -> Result<Vec<SlideImage>, RenderError> {
    let pdfium = pdfium_locate::bind_pdfium(library)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| RenderError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut slides = Vec::with_capacity(pages.len() as usize);

    for (i, page) in pages.iter().enumerate() {
        let index = i + 1;
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            RenderError::RasterisationFailed {
                page: index,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index,
            image.width(),
            image.height()
        );

        slides.push(SlideImage { index, image });
    }

    Ok(slides)
}
