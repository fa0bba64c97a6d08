//! Slide analysis: one slide image in, one description string out.
//!
//! The controller only sees the [`SlideAnalyzer`] trait. Two implementations:
//!
//! * [`OpenRouterAnalyzer`]: OpenAI-compatible `/chat/completions` over
//!   `reqwest`, configured explicitly through [`AnalyzerConfig`].
//! * [`ProviderAnalyzer`]: any `edgequake-llm` provider (OpenAI, Anthropic,
//!   Gemini, Ollama …).
//!
//! Both send the analysis policy as the system message and a user message made
//! of the short slide prompt plus the image. The first completion is returned
//! verbatim. Failures are returned, never retried: the controller turns them
//! into a resume hint.

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::pipeline::encode::{data_uri, mime_for_path, to_base64};
use crate::pipeline::input::is_url;
use crate::prompts::{user_prompt, SLIDE_ANALYSIS_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Where the slide image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image, passed to the endpoint by reference.
    Url(String),
    /// Local file, embedded as a base64 data-URI.
    Local(PathBuf),
}

impl ImageSource {
    /// Classify a user-supplied string: `http(s)://` is a URL, anything else a path.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            ImageSource::Url(input.to_string())
        } else {
            ImageSource::Local(PathBuf::from(input))
        }
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Local(path.to_path_buf())
    }
}

/// Describes one slide image.
pub trait SlideAnalyzer: Send + Sync {
    /// Return the model's description of `image`, with optional free-text `context`.
    fn analyze(
        &self,
        image: &ImageSource,
        context: Option<&str>,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

async fn read_image(path: &Path) -> Result<Vec<u8>, AnalysisError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| AnalysisError::ImageRead {
            path: path.to_path_buf(),
            source,
        })
}

/// URL the endpoint receives for `image`: the URL itself, or a data-URI.
pub async fn image_url_for(image: &ImageSource) -> Result<String, AnalysisError> {
    match image {
        ImageSource::Url(url) => Ok(url.clone()),
        ImageSource::Local(path) => {
            let bytes = read_image(path).await?;
            Ok(data_uri(&bytes, mime_for_path(path)))
        }
    }
}

// ── OpenAI-compatible client ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum RequestMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn build_request<'a>(
    config: &'a AnalyzerConfig,
    context: Option<&str>,
    image_url: String,
) -> ChatRequest<'a> {
    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(SLIDE_ANALYSIS_PROMPT);

    ChatRequest {
        model: &config.model,
        messages: vec![
            RequestMessage::System { content: system },
            RequestMessage::User {
                content: vec![
                    ContentPart::Text {
                        text: user_prompt(context),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ],
            },
        ],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

fn parse_response(body: &str) -> Result<String, AnalysisError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(AnalysisError::EmptyResponse)
}

fn status_error(
    endpoint: &str,
    status: StatusCode,
    body: String,
    retry_after_secs: Option<u64>,
) -> AnalysisError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::Auth {
            endpoint: endpoint.to_string(),
            detail: body,
        },
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimited {
            endpoint: endpoint.to_string(),
            retry_after_secs,
        },
        _ => AnalysisError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

/// Analyzer that talks to an OpenAI-compatible endpoint (OpenRouter by default).
#[derive(Debug, Clone)]
pub struct OpenRouterAnalyzer {
    client: reqwest::Client,
    config: AnalyzerConfig,
    endpoint: String,
}

impl OpenRouterAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        let endpoint = config.completions_url();
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

impl SlideAnalyzer for OpenRouterAnalyzer {
    async fn analyze(
        &self,
        image: &ImageSource,
        context: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let start = Instant::now();
        let image_url = image_url_for(image).await?;
        let request = build_request(&self.config, context, image_url);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(&self.endpoint, status, body, retry_after_secs));
        }

        let text = parse_response(&body)?;
        debug!(
            "Model {} answered with {} chars in {:?}",
            self.config.model,
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}

// ── edgequake-llm provider ───────────────────────────────────────────────

/// Analyzer backed by an `edgequake-llm` provider.
pub struct ProviderAnalyzer {
    provider: Arc<dyn LLMProvider>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl ProviderAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn with_max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = Some(n);
        self
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}

impl SlideAnalyzer for ProviderAnalyzer {
    async fn analyze(
        &self,
        image: &ImageSource,
        context: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let image_data = match image {
            ImageSource::Url(url) => ImageData::from_url(url.as_str()),
            ImageSource::Local(path) => {
                let bytes = read_image(path).await?;
                ImageData::new(to_base64(&bytes), mime_for_path(path))
            }
        };

        let system = self
            .system_prompt
            .as_deref()
            .unwrap_or(SLIDE_ANALYSIS_PROMPT);
        let user = user_prompt(context);
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user_with_images(user.as_str(), vec![image_data]),
        ];
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| AnalysisError::Provider(format!("{}", e)))?;

        debug!(
            "Provider answered: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::builder("sk-test").build().unwrap()
    }

    #[test]
    fn image_source_classification() {
        assert_eq!(
            ImageSource::parse("https://cdn.example.org/s1.jpg"),
            ImageSource::Url("https://cdn.example.org/s1.jpg".into())
        );
        assert_eq!(
            ImageSource::parse("out/deck_slides/slide_001.jpg"),
            ImageSource::Local(PathBuf::from("out/deck_slides/slide_001.jpg"))
        );
    }

    #[test]
    fn request_shape_matches_chat_completions() {
        let cfg = config();
        let req = build_request(&cfg, Some("Board meeting"), "https://x/s.jpg".into());
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["model"], "openai/gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], SLIDE_ANALYSIS_PROMPT);
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(
            value["messages"][1]["content"][0],
            json!({"type": "text", "text": "Analyze this slide. Additional context: Board meeting"})
        );
        assert_eq!(
            value["messages"][1]["content"][1],
            json!({"type": "image_url", "image_url": {"url": "https://x/s.jpg"}})
        );
        assert!(value.get("temperature").is_none());
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn optional_sampling_fields_are_forwarded() {
        let cfg = AnalyzerConfig::builder("k")
            .temperature(0.2)
            .max_tokens(800)
            .system_prompt("custom policy")
            .build()
            .unwrap();
        let value = serde_json::to_value(build_request(&cfg, None, "u".into())).unwrap();
        assert_eq!(value["max_tokens"], 800);
        assert!(value["temperature"].as_f64().is_some());
        assert_eq!(value["messages"][0]["content"], "custom policy");
        assert_eq!(value["messages"][1]["content"][0]["text"], "Analyze this slide.");
    }

    #[test]
    fn response_first_choice_is_returned_verbatim() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  \"Q3\"\n- up 12%  "}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "  \"Q3\"\n- up 12%  ");
    }

    #[test]
    fn empty_or_null_content_is_an_error() {
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(AnalysisError::EmptyResponse)
        ));
        assert!(matches!(
            parse_response(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(AnalysisError::EmptyResponse)
        ));
        assert!(matches!(
            parse_response("not json"),
            Err(AnalysisError::InvalidResponse(_))
        ));
    }

    #[test]
    fn status_mapping() {
        let ep = "https://openrouter.ai/api/v1/chat/completions";
        assert!(matches!(
            status_error(ep, StatusCode::UNAUTHORIZED, "bad key".into(), None),
            AnalysisError::Auth { .. }
        ));
        match status_error(ep, StatusCode::TOO_MANY_REQUESTS, String::new(), Some(20)) {
            AnalysisError::RateLimited {
                retry_after_secs, ..
            } => assert_eq!(retry_after_secs, Some(20)),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            status_error(ep, StatusCode::BAD_GATEWAY, "upstream".into(), None),
            AnalysisError::Api { status: 502, .. }
        ));
    }

    #[tokio::test]
    async fn local_images_become_data_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide_001.jpg");
        std::fs::write(&path, b"\xFF\xD8jpeg").unwrap();

        let url = image_url_for(&ImageSource::Local(path)).await.unwrap();
        assert_eq!(url, data_uri(b"\xFF\xD8jpeg", "image/jpeg"));

        let remote = ImageSource::Url("https://x/y.png".into());
        assert_eq!(image_url_for(&remote).await.unwrap(), "https://x/y.png");
    }

    #[tokio::test]
    async fn missing_local_image_is_image_read_error() {
        let err = image_url_for(&ImageSource::Local("/no/such/slide.jpg".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ImageRead { .. }));
    }

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let reply = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (format!("http://{addr}/v1"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn analyzer_posts_and_returns_completion() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"content":"\"Roadmap 2025\""}}]}"#,
        )
        .await;
        let cfg = AnalyzerConfig::builder("sk-local")
            .base_url(base_url)
            .build()
            .unwrap();
        let analyzer = OpenRouterAnalyzer::new(cfg).unwrap();

        let text = analyzer
            .analyze(&ImageSource::Url("https://x/s1.jpg".into()), Some("kickoff"))
            .await
            .unwrap();
        assert_eq!(text, "\"Roadmap 2025\"");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"), "got: {request}");
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-local"));
        assert!(request.contains("Additional context: kickoff"));
    }

    #[tokio::test]
    async fn analyzer_maps_auth_failure() {
        let (base_url, server) =
            serve_once("HTTP/1.1 401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let cfg = AnalyzerConfig::builder("sk-wrong")
            .base_url(base_url)
            .build()
            .unwrap();
        let analyzer = OpenRouterAnalyzer::new(cfg).unwrap();

        let err = analyzer
            .analyze(&ImageSource::Url("https://x/s1.jpg".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Auth { .. }), "got: {err:?}");
        server.await.unwrap();
    }
}
