//! Configuration types for slide extraction and analysis.
//!
//! Two structs, one per collaborator:
//!
//! * [`PipelineConfig`] drives the controller: rendering resolution, JPEG
//!   quality, pacing, resume point and output location.
//! * [`AnalyzerConfig`] drives the vision-model client: endpoint, API key,
//!   model and sampling options.
//!
//! Neither reads the environment. Binaries resolve environment variables once
//! (through clap) and pass the values in.

use crate::error::SlidesError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default vision model on OpenRouter.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default directory that receives the analysis file and slide images.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Configuration for one slide-extraction run.
///
/// # Example
/// ```rust
/// use deckscribe::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_dir("out")
///     .start_slide(4)
///     .context("Quarterly sales review")
///     .build()
///     .unwrap();
/// assert_eq!(config.start_slide, 4);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Rendering DPI used when rasterising each page. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// JPEG quality for saved slide images, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Pause after each appended record, including the last. Default: 2 s.
    pub pacing: Duration,

    /// First slide (1-based) to process. Earlier slides are skipped entirely.
    /// Default: 1.
    pub start_slide: usize,

    /// Free-text context appended to every analysis prompt.
    pub context: Option<String>,

    /// Directory holding `{stem}_analysis.txt` and `{stem}_slides/`. Default: `output`.
    pub output_dir: PathBuf,

    /// PDFium shared library to bind. `None` binds the system library.
    pub pdfium_library: Option<PathBuf>,

    /// Per-slide progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            jpeg_quality: 95,
            pacing: Duration::from_secs(2),
            start_slide: 1,
            context: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pacing", &self.pacing)
            .field("start_slide", &self.start_slide)
            .field("context", &self.context)
            .field("output_dir", &self.output_dir)
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }

    pub fn pacing_ms(self, ms: u64) -> Self {
        self.pacing(Duration::from_millis(ms))
    }

    pub fn start_slide(mut self, n: usize) -> Self {
        self.config.start_slide = n;
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.config.context = Some(context.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SlidesError> {
        let c = &self.config;
        if c.start_slide == 0 {
            return Err(SlidesError::InvalidConfig(
                "start slide is 1-based, got 0".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(SlidesError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the OpenAI-compatible analyzer client.
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Bearer token sent to the endpoint.
    pub api_key: String,

    /// Base URL; `/chat/completions` is appended. Default: OpenRouter.
    pub base_url: String,

    /// Model identifier. Default: `openai/gpt-4o-mini`.
    pub model: String,

    /// Replaces [`crate::prompts::SLIDE_ANALYSIS_PROMPT`] when set.
    pub system_prompt: Option<String>,

    /// Sampling temperature; omitted from the request when `None`.
    pub temperature: Option<f32>,

    /// Completion token cap; omitted from the request when `None`.
    pub max_tokens: Option<usize>,

    /// HTTP request timeout in seconds. Default: 120.
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder(api_key: impl Into<String>) -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                ..Self::default()
            },
        }
    }

    /// Full chat-completions URL for this configuration.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, SlidesError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(SlidesError::InvalidConfig(
                "API key is empty; set OPENROUTER_API_KEY or pass --api-key".into(),
            ));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(SlidesError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(SlidesError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.dpi, 150);
        assert_eq!(c.jpeg_quality, 95);
        assert_eq!(c.pacing, Duration::from_secs(2));
        assert_eq!(c.start_slide, 1);
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert!(c.pdfium_library.is_none());
    }

    #[test]
    fn builder_clamps_ranges() {
        let c = PipelineConfig::builder()
            .dpi(1000)
            .jpeg_quality(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 400);
        assert_eq!(c.jpeg_quality, 1);
    }

    #[test]
    fn start_slide_zero_is_rejected() {
        let err = PipelineConfig::builder().start_slide(0).build().unwrap_err();
        assert!(matches!(err, SlidesError::InvalidConfig(_)));
    }

    #[test]
    fn analyzer_requires_api_key() {
        let err = AnalyzerConfig::builder("  ").build().unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn analyzer_debug_redacts_key() {
        let c = AnalyzerConfig::builder("sk-or-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-or-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let c = AnalyzerConfig::builder("k")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(
            AnalyzerConfig::default().completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
