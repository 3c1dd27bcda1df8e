//! Anthropic Claude integration.
//!
//! Implements `ResearchService` on the Anthropic Messages API with the
//! server-side web-search tool enabled. Handles request construction,
//! text extraction, cost tracking and retry with exponential backoff.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ResearchService;
use crate::config::LlmConfig;
use crate::types::AlphaError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const WEB_SEARCH_TOOL_NAME: &str = "web_search";

/// Maximum retries on rate limit, server and connect errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 1000;

/// Output budget for the connectivity check.
const PING_MAX_TOKENS: u32 = 20;

/// Approximate cost per 1K input tokens (Sonnet).
const INPUT_COST_PER_1K: f64 = 0.003;
/// Approximate cost per 1K output tokens (Sonnet).
const OUTPUT_COST_PER_1K: f64 = 0.015;
/// Cost per web search performed by the server tool.
const WEB_SEARCH_COST: f64 = 0.01;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_uses: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Text, server tool use and search results all arrive as content blocks;
/// only `text` blocks carry the answer.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    server_tool_use: Option<ServerToolUse>,
}

#[derive(Debug, Deserialize, Default)]
struct ServerToolUse {
    #[serde(default)]
    web_search_requests: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    #[serde(default)]
    error_type: String,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Result of one HTTP attempt against the Messages API.
#[derive(Debug, Clone)]
enum Attempt {
    /// The server answered, with any status.
    Response { status: StatusCode, body: String },
    /// No response arrived.
    Failed {
        message: String,
        timeout: bool,
        connect: bool,
    },
}

impl Attempt {
    fn from_error(e: &reqwest::Error) -> Self {
        Self::Failed {
            message: e.to_string(),
            timeout: e.is_timeout(),
            connect: e.is_connect(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Response { status, body } => {
                format!("{status}: {}", AnthropicClient::error_message(body))
            }
            Self::Failed { message, timeout: true, .. } => format!("request timed out: {message}"),
            Self::Failed { message, .. } => format!("request error: {message}"),
        }
    }
}

/// Whether a failed attempt is worth repeating.
///
/// Rate limits, server errors (including 529 overloaded) and connect
/// failures are retried. Timeouts already spent the full request budget
/// and fail at once, as does every other client error.
fn is_retryable(attempt: &Attempt) -> bool {
    match attempt {
        Attempt::Response { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        Attempt::Failed { timeout, connect, .. } => *connect && !*timeout,
    }
}

/// Sends one encoded Messages request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
trait MessagesTransport: Send + Sync {
    async fn post(&self, payload: String) -> Attempt;
}

struct HttpTransport {
    http: Client,
    api_key: SecretString,
}

#[async_trait]
impl MessagesTransport for HttpTransport {
    async fn post(&self, payload: String) -> Attempt {
        let sent = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .body(payload)
            .send()
            .await;

        match sent {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => Attempt::Response { status, body },
                    Err(e) => Attempt::from_error(&e),
                }
            }
            Err(e) => Attempt::from_error(&e),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct AnthropicClient {
    transport: Box<dyn MessagesTransport>,
    model: String,
    max_tokens: u32,
    web_search_max_uses: u32,
    backoff: Duration,
    total_cost: AtomicU64, // stored as cost * 1_000_000
    total_calls: AtomicU64,
}

impl AnthropicClient {
    pub fn new(api_key: SecretString, cfg: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("Failed to build Anthropic HTTP client")?;

        Ok(Self::with_transport(
            Box::new(HttpTransport { http, api_key }),
            cfg,
            Duration::from_millis(BASE_BACKOFF_MS),
        ))
    }

    fn with_transport(
        transport: Box<dyn MessagesTransport>,
        cfg: &LlmConfig,
        backoff: Duration,
    ) -> Self {
        Self {
            transport,
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            web_search_max_uses: cfg.web_search_max_uses,
            backoff,
            total_cost: AtomicU64::new(0),
            total_calls: AtomicU64::new(0),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Research request: user prompt plus the web-search tool.
    fn research_request(&self, prompt: &str) -> MessagesRequest {
        let max_uses = (self.web_search_max_uses > 0).then_some(self.web_search_max_uses);
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            tools: vec![Tool {
                tool_type: WEB_SEARCH_TOOL_TYPE,
                name: WEB_SEARCH_TOOL_NAME,
                max_uses,
            }],
        }
    }

    /// Tiny tool-less request used to check key and connectivity.
    fn ping_request(&self) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: PING_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: "Say 'Ready'".to_string(),
            }],
            tools: Vec::new(),
        }
    }

    /// Check the API key and connectivity. Returns the model's reply.
    pub async fn ping(&self) -> Result<String> {
        let (text, _, _) = self.call_api(&self.ping_request()).await?;
        Ok(text)
    }

    fn llm_error(&self, message: String) -> anyhow::Error {
        AlphaError::Llm {
            model: self.model.clone(),
            message,
        }
        .into()
    }

    /// Send a messages request with retry + backoff.
    async fn call_api(&self, request: &MessagesRequest) -> Result<(String, u32, f64)> {
        let payload = serde_json::to_string(request).context("Failed to encode Anthropic request")?;
        let mut last_error = String::new();

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = self.backoff * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying Anthropic API call");
                tokio::time::sleep(delay).await;
            }

            let outcome = self.transport.post(payload.clone()).await;
            if let Attempt::Response { status, body } = &outcome {
                if status.is_success() {
                    return self.record_success(body);
                }
            }

            let message = outcome.describe();
            if !is_retryable(&outcome) {
                warn!(attempt, error = %message, "Anthropic API call failed");
                return Err(self.llm_error(message));
            }
            warn!(attempt, error = %message, "Retryable Anthropic API error");
            last_error = message;
        }

        Err(self.llm_error(format!("failed after {MAX_RETRIES} retries: {last_error}")))
    }

    /// Decode a successful response and add its cost to the running totals.
    fn record_success(&self, raw: &str) -> Result<(String, u32, f64)> {
        let body: MessagesResponse =
            serde_json::from_str(raw).context("Failed to parse Anthropic response")?;

        let text = Self::collect_text(&body);
        let usage = body.usage.unwrap_or_default();
        let total_tokens = usage.input_tokens + usage.output_tokens;
        let cost = Self::usage_cost(&usage);

        self.total_cost
            .fetch_add((cost * 1_000_000.0) as u64, Ordering::Relaxed);
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        debug!(
            tokens = total_tokens,
            stop_reason = ?body.stop_reason,
            cost = format!("${:.4}", cost),
            "Anthropic call complete"
        );
        Ok((text, total_tokens, cost))
    }

    /// Concatenate every text block in order, skipping tool blocks.
    fn collect_text(body: &MessagesResponse) -> String {
        body.content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn usage_cost(usage: &Usage) -> f64 {
        let searches = usage
            .server_tool_use
            .as_ref()
            .map(|s| s.web_search_requests)
            .unwrap_or(0);
        (usage.input_tokens as f64 / 1000.0) * INPUT_COST_PER_1K
            + (usage.output_tokens as f64 / 1000.0) * OUTPUT_COST_PER_1K
            + searches as f64 * WEB_SEARCH_COST
    }

    /// Pull the human-readable message out of an API error body.
    fn error_message(raw: &str) -> String {
        match serde_json::from_str::<ApiError>(raw) {
            Ok(ApiError { error: Some(e) }) if !e.message.is_empty() => {
                format!("{} ({})", e.message, e.error_type)
            }
            _ => raw.to_string(),
        }
    }

    /// Total cumulative cost across all calls.
    pub fn cumulative_cost(&self) -> f64 {
        self.total_cost.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Total number of successful API calls made.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// ResearchService implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ResearchService for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Requesting market research");

        let (text, tokens, cost) = self
            .call_api(&self.research_request(prompt))
            .await
            .context("Anthropic research call failed")?;

        info!(
            tokens,
            cost = format!("${:.4}", cost),
            cumulative = format!("${:.4}", self.cumulative_cost()),
            "Research response received"
        );
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
