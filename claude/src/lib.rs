//! Minimal Anthropic Claude API client.
//!
//! This crate provides a focused client for Claude's Messages API with:
//! - Non-streaming and streaming completions
//! - Proper SSE parsing for streaming responses
//! - A hard per-call deadline with cancellation

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Errors that can occur when using the Claude client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("request exceeded the {0:?} deadline")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the caller may reasonably retry the same request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Network(_) | Error::Api { .. }
        )
    }
}

/// Claude API client.
///
/// Construction fails if no API key is available; a missing credential is a
/// startup-time error, never a per-call one.
#[derive(Clone)]
pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
    deadline: Duration,
}

impl Claude {
    /// Create a new Claude client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            deadline: DEFAULT_DEADLINE,
        })
    }

    /// Create a Claude client from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| Error::NoApiKey)?;
        Self::new(api_key)
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-call deadline. Applies to the whole call, including the
    /// full drain of a streaming response.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Send a completion request and return the full response.
    ///
    /// The call is bounded by the client deadline; on expiry the in-flight
    /// request future is dropped, which aborts the underlying connection,
    /// and [`Error::Timeout`] is returned.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        tokio::time::timeout(self.deadline, self.complete_inner(request))
            .await
            .map_err(|_| Error::Timeout(self.deadline))?
    }

    /// Send a completion request and stream the response.
    ///
    /// `on_text` is invoked once per incremental text fragment, in arrival
    /// order. The fully concatenated text and best-effort usage counts are
    /// returned once the stream ends. The same deadline and cancellation
    /// rules as [`Claude::complete`] apply.
    pub async fn stream<F>(&self, request: Request, mut on_text: F) -> Result<Response, Error>
    where
        F: FnMut(&str),
    {
        tokio::time::timeout(self.deadline, self.stream_inner(request, &mut on_text))
            .await
            .map_err(|_| Error::Timeout(self.deadline))?
    }

    /// One tiny round-trip to verify the key and connectivity.
    pub async fn check(&self) -> Result<(), Error> {
        let request =
            Request::new(vec![Message::user("Reply with the single word: ok")]).with_max_tokens(16);
        self.complete(request).await.map(|_| ())
    }

    async fn complete_inner(&self, request: Request) -> Result<Response, Error> {
        let response = self.post(&request, false).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let text = api_response
            .content
            .iter()
            .filter_map(ApiContent::as_text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Response {
            text,
            stop_reason: parse_stop_reason(api_response.stop_reason.as_deref()),
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }

    async fn stream_inner<F>(&self, request: Request, on_text: &mut F) -> Result<Response, Error>
    where
        F: FnMut(&str),
    {
        let response = self.post(&request, true).await?;

        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut text = String::new();
        let mut usage = Usage::default();
        let mut stop_reason = StopReason::EndTurn;

        while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(|e| Error::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            for event in drain_sse_events(&mut buffer)? {
                match event {
                    ApiStreamEvent::MessageStart { message } => {
                        usage.input_tokens = message.usage.input_tokens;
                    }
                    ApiStreamEvent::ContentBlockDelta { delta } => {
                        if let ApiDelta::TextDelta { text: fragment } = delta {
                            on_text(&fragment);
                            text.push_str(&fragment);
                        }
                    }
                    ApiStreamEvent::MessageDelta {
                        delta,
                        usage: delta_usage,
                    } => {
                        if let Some(reason) = delta.stop_reason {
                            stop_reason = parse_stop_reason(Some(&reason));
                        }
                        if let Some(u) = delta_usage {
                            usage.output_tokens = u.output_tokens;
                        }
                    }
                    ApiStreamEvent::Error { error } => {
                        return Err(Error::Api {
                            status: 0,
                            message: error.message,
                        });
                    }
                    ApiStreamEvent::MessageStop | ApiStreamEvent::Ignored => {}
                }
            }
        }

        Ok(Response {
            text,
            stop_reason,
            usage,
        })
    }

    async fn post(&self, request: &Request, stream: bool) -> Result<reqwest::Response, Error> {
        let api_request = ApiRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: &request.messages,
            temperature: request.temperature,
            stream,
        };
        let headers = self.build_headers()?;

        debug!(model = api_request.model, stream, "sending messages request");

        let response = self
            .client
            .post(format!("{API_BASE}/messages"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "messages request rejected");
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        Ok(response)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request to send to Claude.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: usize,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            system: None,
            messages,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A plain-text message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A completion response from Claude.
#[derive(Debug, Clone)]
pub struct Response {
    /// All text content, concatenated.
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

fn parse_stop_reason(raw: Option<&str>) -> StopReason {
    match raw {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Ignored,
}

impl ApiContent {
    fn as_text(&self) -> Option<&str> {
        match self {
            ApiContent::Text { text } => Some(text),
            ApiContent::Ignored => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

// Streaming types
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiStreamEvent {
    MessageStart {
        message: ApiMessageStart,
    },
    ContentBlockDelta {
        delta: ApiDelta,
    },
    MessageDelta {
        delta: ApiMessageDelta,
        #[serde(default)]
        usage: Option<ApiDeltaUsage>,
    },
    MessageStop,
    Error {
        error: ApiError,
    },
    /// ping, content_block_start, content_block_stop, ...
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ApiMessageStart {
    #[serde(default)]
    usage: ApiStartUsage,
}

#[derive(Debug, Default, Deserialize)]
struct ApiStartUsage {
    #[serde(default)]
    input_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ApiMessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDeltaUsage {
    #[serde(default)]
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Parse SSE events from a buffer, consuming complete events and leaving
/// incomplete data.
///
/// SSE events are newline-delimited `data:` lines. Complete lines are parsed
/// and removed from the buffer; a line whose JSON ends abruptly is left in
/// place until the next network chunk completes it.
fn drain_sse_events(buffer: &mut String) -> Result<Vec<ApiStreamEvent>, Error> {
    let mut events = Vec::new();

    loop {
        let Some(newline_pos) = buffer.find('\n') else {
            // No complete line yet, wait for more data
            break;
        };

        let line = buffer[..newline_pos].trim_end_matches('\r');

        if let Some(json_str) = line.strip_prefix("data: ") {
            if json_str == "[DONE]" {
                events.push(ApiStreamEvent::MessageStop);
            } else if !json_str.is_empty() {
                match serde_json::from_str::<ApiStreamEvent>(json_str) {
                    Ok(event) => events.push(event),
                    Err(e) if e.is_eof() => break,
                    Err(e) => return Err(Error::Parse(format!("SSE parse error: {e}"))),
                }
            }
        }
        // Skip event: lines, empty lines, and other SSE metadata

        buffer.drain(..=newline_pos);
    }

    Ok(events)
}
