//! LLM Client — the single point of entry for all completion-endpoint calls
//! in RefineCV.
//!
//! ARCHITECTURAL RULE: No other module may call the AI provider directly.
//! All LLM interactions MUST go through this module.
//!
//! The client speaks the OpenAI-compatible chat-completions wire format and
//! requests JSON-object output mode. There is no retry loop: a failed call
//! surfaces immediately and the caller decides whether to re-invoke.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod repair;

use repair::{extract_object_span, strip_control_chars, strip_json_fences, strip_trailing_commas};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 4000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("JSON parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by all services in RefineCV.
#[derive(Clone, Debug)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Builds a client. Fails with `Configuration` when the credential is
    /// missing, so no call can be attempted without one.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "AI API key is not configured. Set REFINECV_AI_API_KEY in your environment \
                 or .env file and restart the service."
                    .to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Makes one call to the chat-completions endpoint and returns the raw
    /// text content of the first choice. No retries.
    pub async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {status}: {message}");
            return Err(build_api_error(status.as_u16(), message));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!("LLM call succeeded ({} chars)", content.len());
        Ok(content)
    }

    /// Calls the LLM and recovers a JSON object from the response text,
    /// tolerating the usual model failure modes (code fences, surrounding
    /// prose, trailing commas, stray control bytes).
    pub async fn call_json(&self, prompt: &str) -> Result<Value, LlmError> {
        let content = self.call(prompt).await?;
        parse_lenient(&content)
    }
}

/// Wraps a non-success status, enriching authentication-class failures with
/// remediation steps instead of a bare status code.
fn build_api_error(status: u16, message: String) -> LlmError {
    let auth_failure =
        status == 401 || message.contains("User not found") || message.contains("Invalid API key");
    if auth_failure {
        return LlmError::Api {
            status,
            message: format!(
                "{message}. The AI provider rejected the configured credential. \
                 Check that REFINECV_AI_API_KEY holds a valid key, that the provider \
                 account is activated, and restart the service after updating .env."
            ),
        };
    }
    LlmError::Api { status, message }
}

/// Parses model output into a JSON object, applying progressively more
/// aggressive repairs before giving up.
///
/// Ladder: strict parse → strip trailing commas → strip control characters.
/// On exhaustion the ORIGINAL strict-parse error position is reported, since
/// repaired text no longer lines up with what the model sent.
pub fn parse_lenient(content: &str) -> Result<Value, LlmError> {
    let text = strip_json_fences(content);
    let text = extract_object_span(text);

    let original_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    warn!(
        "Strict JSON parse failed at line {}, column {} — attempting repair",
        original_err.line(),
        original_err.column()
    );

    let without_commas = strip_trailing_commas(text);
    if let Ok(value) = serde_json::from_str::<Value>(&without_commas) {
        return Ok(value);
    }

    let without_controls = strip_control_chars(&without_commas);
    if let Ok(value) = serde_json::from_str::<Value>(&without_controls) {
        return Ok(value);
    }

    Err(LlmError::Parse {
        line: original_err.line(),
        column: original_err.column(),
        message: original_err.to_string(),
    })
}
