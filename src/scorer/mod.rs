//! Relevance scorer implementations.
//!
//! Concrete [`RelevanceScorer`] backends, selected by `[scorer].provider`:
//! - **[`HeuristicScorer`]**: offline, deterministic, path-based rating. Default.
//! - **[`OpenAIScorer`]**: OpenAI chat completions with a JSON response format.
//! - **[`OllamaScorer`]**: a local Ollama instance's `/api/chat` endpoint.
//! - **[`DisabledScorer`]**: always fails; every document then scores 0
//!   and selection falls back to the full collection.
//!
//! # Retry Strategy
//!
//! The HTTP scorers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

mod heuristic;
mod prompt;

pub use heuristic::HeuristicScorer;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use readmegen_core::assess::RelevanceScorer;
use readmegen_core::models::Document;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScorerConfig;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Instantiate the scorer named by `config.provider`.
///
/// # Errors
///
/// Fails for an unknown provider, a remote provider without `model`, or
/// `openai` without `OPENAI_API_KEY` in the environment.
pub fn create_scorer(config: &ScorerConfig) -> Result<Arc<dyn RelevanceScorer>> {
    match config.provider.as_str() {
        "heuristic" => Ok(Arc::new(HeuristicScorer)),
        "disabled" => Ok(Arc::new(DisabledScorer)),
        "openai" => Ok(Arc::new(OpenAIScorer::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaScorer::new(config)?)),
        other => bail!("Unknown scorer provider: {}", other),
    }
}

// ============ Disabled Scorer ============

/// A scorer that refuses every document.
pub struct DisabledScorer;

#[async_trait]
impl RelevanceScorer for DisabledScorer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn score(&self, _document: &Document) -> Result<Value> {
        bail!("Relevance scorer is disabled")
    }
}

// ============ OpenAI Scorer ============

/// Scorer backed by the OpenAI chat completions API.
///
/// Calls `POST /v1/chat/completions` with `response_format = json_object`.
/// Requires the `OPENAI_API_KEY` environment variable. `[scorer].url`
/// points it at any OpenAI-compatible endpoint.
pub struct OpenAIScorer {
    label: String,
    model: String,
    url: String,
    api_key: String,
    sample_chars: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("scorer.model required for OpenAI provider"))?;

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            label: format!("openai:{}", model),
            model,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_URL.to_string()),
            api_key,
            sample_chars: config.sample_chars,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl RelevanceScorer for OpenAIScorer {
    fn name(&self) -> &str {
        &self.label
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": prompt::SYSTEM_PROMPT },
                { "role": "user", "content": prompt::user_prompt(document, self.sample_chars) },
            ],
        });

        let endpoint = format!("{}/v1/chat/completions", self.url.trim_end_matches('/'));
        let response = send_with_retry("OpenAI", self.max_retries, || {
            self.client
                .post(&endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
        })
        .await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))?;
        parse_json_object(content)
    }
}

// ============ Ollama Scorer ============

/// Scorer backed by a local Ollama instance.
///
/// Calls `POST /api/chat` with `format = "json"` on the configured URL
/// (default: `http://localhost:11434`).
pub struct OllamaScorer {
    label: String,
    model: String,
    url: String,
    sample_chars: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("scorer.model required for Ollama provider"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            label: format!("ollama:{}", model),
            model,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string()),
            sample_chars: config.sample_chars,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl RelevanceScorer for OllamaScorer {
    fn name(&self) -> &str {
        &self.label
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "format": "json",
            "messages": [
                { "role": "system", "content": prompt::SYSTEM_PROMPT },
                { "role": "user", "content": prompt::user_prompt(document, self.sample_chars) },
            ],
        });

        let endpoint = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let response = send_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&body)
        })
        .await
        .with_context(|| format!("Ollama request failed (is Ollama running at {}?)", self.url))?;

        let content = response
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message content"))?;
        parse_json_object(content)
    }
}

// ============ Shared HTTP plumbing ============

/// Send a JSON request, retrying transient failures with exponential backoff.
///
/// `build` is called once per attempt since a sent request is consumed.
async fn send_with_retry<F>(service: &str, max_retries: u32, build: F) -> Result<Value>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                // Rate limited or server error, retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    tracing::debug!(service, %status, attempt, "retryable scorer error");
                    last_err = Some(anyhow::anyhow!(
                        "{} API error {}: {}",
                        service,
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429), don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("{} API error {}: {}", service, status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", service)))
}

/// Parse model output that should be a single JSON object.
///
/// Models occasionally wrap the object in a Markdown code fence; the fence
/// is stripped before parsing.
fn parse_json_object(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).context("Scorer returned invalid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmegen_core::models::DocumentKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn doc() -> Document {
        Document::new("main.py", "print(1)\n".into(), DocumentKind::Source, false)
    }

    /// Serve `responses` in order, one connection each, counting requests.
    async fn scripted_server(responses: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let reason = match status {
                    200 => "OK",
                    400 => "Bad Request",
                    429 => "Too Many Requests",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (url, hits)
    }

    /// Consume the request head and its `Content-Length` body.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let length: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn openai_scorer(url: String) -> OpenAIScorer {
        OpenAIScorer {
            label: "openai:test".to_string(),
            model: "test".to_string(),
            url,
            api_key: "sk-test".to_string(),
            sample_chars: 200,
            max_retries: 2,
            client: reqwest::Client::new(),
        }
    }

    fn openai_body(content: &str) -> String {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
    }

    #[tokio::test]
    async fn rate_limited_request_is_retried() {
        let (url, hits) = scripted_server(vec![
            (429, r#"{"error": "slow down"}"#.to_string()),
            (200, openai_body(r#"{"score": 4, "include": true, "rationale": "entrypoint"}"#)),
        ])
        .await;

        let value = openai_scorer(url).score(&doc()).await.unwrap();
        assert_eq!(value["score"], 4);
        assert_eq!(value["include"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let (url, hits) = scripted_server(vec![
            (400, r#"{"error": "bad model"}"#.to_string()),
            (200, openai_body(r#"{"score": 4, "include": true}"#)),
        ])
        .await;

        let err = openai_scorer(url).score(&doc()).await.unwrap_err();
        assert!(err.to_string().contains("400"), "error: {}", err);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ollama_fenced_message_content_is_parsed() {
        let content = "```json\n{\"score\": 2, \"include\": false, \"reason\": \"fixture\"}\n```";
        let body = json!({ "message": { "role": "assistant", "content": content }, "done": true });
        let (url, hits) = scripted_server(vec![(200, body.to_string())]).await;

        let config = ScorerConfig {
            provider: "ollama".to_string(),
            model: Some("llama3".to_string()),
            url: Some(url),
            ..ScorerConfig::default()
        };
        let value = OllamaScorer::new(&config).unwrap().score(&doc()).await.unwrap();
        assert_eq!(value["score"], 2);
        assert_eq!(value["include"], false);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = parse_json_object(r#"{"score": 4, "include": true}"#).unwrap();
        assert_eq!(plain["score"], 4);

        let fenced = parse_json_object("```json\n{\"score\": 2, \"include\": false}\n```").unwrap();
        assert_eq!(fenced["include"], false);

        assert!(parse_json_object("score: 4").is_err());
    }

    #[test]
    fn create_scorer_dispatches_on_provider() {
        let config = ScorerConfig::default();
        assert_eq!(create_scorer(&config).unwrap().name(), "heuristic");

        let disabled = ScorerConfig {
            provider: "disabled".to_string(),
            ..ScorerConfig::default()
        };
        assert_eq!(create_scorer(&disabled).unwrap().name(), "disabled");

        let unknown = ScorerConfig {
            provider: "magic".to_string(),
            ..ScorerConfig::default()
        };
        assert!(create_scorer(&unknown).is_err());
    }

    #[test]
    fn ollama_requires_model() {
        let config = ScorerConfig {
            provider: "ollama".to_string(),
            ..ScorerConfig::default()
        };
        assert!(OllamaScorer::new(&config).is_err());
    }

    #[tokio::test]
    async fn disabled_scorer_always_fails() {
        let doc = Document::new("a.py", "x".into(), DocumentKind::Source, false);
        assert!(DisabledScorer.score(&doc).await.is_err());
    }
}
