//! Error types for the deckscribe library.
//!
//! Errors are grouped by the stage that raises them:
//!
//! * [`RenderError`]: the PDF could not be rasterised (missing file, not a
//!   PDF, corrupt document, PDFium unavailable).
//! * [`AnalysisError`]: the vision model endpoint or its transport failed.
//! * [`SlideError`]: typed outcome of one slide's save → analyze → persist
//!   step. The controller inspects it, reports the resume hint and aborts.
//! * [`SlidesError`]: **fatal**: what the public entry points return.
//!
//! Nothing here is retried. A failed slide stops the run; the caller resumes
//! with `--start-slide` once the cause is fixed.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the deckscribe library.
#[derive(Debug, Error)]
pub enum SlidesError {
    /// Rasterisation of the input PDF failed before any slide was processed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A slide failed; the run was aborted at `index`.
    #[error(
        "Error processing slide {index}: {source}\n\
         You can resume from slide {index} using --start-slide {index}"
    )]
    SlideFailed {
        index: usize,
        #[source]
        source: SlideError,
    },

    /// Could not create an output directory or read/write a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rebuilt deck could not be written.
    #[error("Failed to write PDF deck '{path}': {detail}")]
    DeckWriteFailed { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SlidesError {
    /// Slide number a re-run should pass as `start_slide`, if the run was
    /// aborted part-way through.
    pub fn resume_index(&self) -> Option<usize> {
        match self {
            SlidesError::SlideFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// PDF rasterisation failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// PDFium could not be loaded.
    #[error(transparent)]
    LibraryUnavailable(#[from] pdfium_locate::PdfiumLocateError),

    /// The blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    TaskFailed(String),
}

/// Vision-model endpoint failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The endpoint rejected the credentials (HTTP 401/403).
    #[error("Authentication error from '{endpoint}': {detail}")]
    Auth { endpoint: String, detail: String },

    /// The endpoint returned HTTP 429.
    #[error("Rate limit exceeded at '{endpoint}'")]
    RateLimited {
        endpoint: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success HTTP status.
    #[error("Model API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Network failure, DNS, TLS, timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Invalid response from model API: {0}")]
    InvalidResponse(String),

    /// The response carried no choice or no text.
    #[error("Model returned no content")]
    EmptyResponse,

    /// A local image could not be read for embedding.
    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error surfaced by an edgequake-llm provider.
    #[error("LLM provider error: {0}")]
    Provider(String),
}

/// Outcome of a failed per-slide step, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum SlideError {
    /// Saving the slide JPEG failed.
    #[error("could not save slide image '{path}': {detail}")]
    Save {
        index: usize,
        path: PathBuf,
        detail: String,
    },

    /// The analyzer failed.
    #[error("analysis failed: {source}")]
    Analysis {
        index: usize,
        #[source]
        source: AnalysisError,
    },

    /// Appending the record to the analysis file failed.
    #[error("could not append to '{path}': {source}")]
    Persist {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SlideError {
    /// 1-based index of the slide that failed.
    pub fn index(&self) -> usize {
        match self {
            SlideError::Save { index, .. }
            | SlideError::Analysis { index, .. }
            | SlideError::Persist { index, .. } => *index,
        }
    }

    /// Name of the failed stage, used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            SlideError::Save { .. } => "saving",
            SlideError::Analysis { .. } => "analyzing",
            SlideError::Persist { .. } => "persisting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_failed_display_has_resume_hint() {
        let e = SlidesError::SlideFailed {
            index: 7,
            source: SlideError::Analysis {
                index: 7,
                source: AnalysisError::EmptyResponse,
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("Error processing slide 7"), "got: {msg}");
        assert!(msg.contains("--start-slide 7"), "got: {msg}");
        assert_eq!(e.resume_index(), Some(7));
    }

    #[test]
    fn resume_hint_appears_once_across_source_chain() {
        let e = SlidesError::SlideFailed {
            index: 3,
            source: SlideError::Analysis {
                index: 3,
                source: AnalysisError::RateLimited {
                    endpoint: "https://openrouter.ai/api/v1".into(),
                    retry_after_secs: None,
                },
            },
        };

        // What anyhow prints: the error, then every `Caused by:` entry.
        let mut rendered = e.to_string();
        let mut cause = std::error::Error::source(&e);
        while let Some(inner) = cause {
            rendered.push('\n');
            rendered.push_str(&inner.to_string());
            cause = inner.source();
        }

        assert_eq!(rendered.matches("--start-slide 3").count(), 1, "got: {rendered}");
    }

    #[test]
    fn other_errors_have_no_resume_index() {
        let e = SlidesError::InvalidConfig("bad".into());
        assert_eq!(e.resume_index(), None);
    }

    #[test]
    fn rate_limit_display() {
        let e = AnalysisError::RateLimited {
            endpoint: "openrouter".into(),
            retry_after_secs: Some(30),
        };
        assert!(e.to_string().contains("openrouter"));
    }

    #[test]
    fn auth_error_display() {
        let e = AnalysisError::Auth {
            endpoint: "openrouter".into(),
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn slide_error_stage_and_index() {
        let e = SlideError::Persist {
            index: 3,
            path: PathBuf::from("out/deck_analysis.txt"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(e.index(), 3);
        assert_eq!(e.stage(), "persisting");
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn render_error_converts_into_fatal() {
        let e: SlidesError = RenderError::FileNotFound {
            path: PathBuf::from("missing.pdf"),
        }
        .into();
        assert!(e.to_string().contains("missing.pdf"));
    }
}
