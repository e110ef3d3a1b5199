//! `VisionBackend` trait and the OpenAI-compatible `ChatVisionBackend`.
//!
//! `ChatVisionBackend` calls any `/chat/completions` endpoint that accepts
//! image parts: Gemini's OpenAI-compatible surface (the default), OpenAI,
//! Groq, Ollama, LM Studio, etc.  Connection details come from
//! [`VisionConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::VisionConfig;

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Errors that can occur while asking the vision model about an image.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// HTTP transport or connection error.
    #[error("vision request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("vision request timed out")]
    Timeout,

    /// The API rejected the credentials.
    #[error("vision API rejected the credentials ({0})")]
    Auth(StatusCode),

    /// The account is rate limited or out of quota.
    #[error("vision API quota exceeded or rate limited")]
    Quota,

    /// Any other non-success HTTP status.
    #[error("vision API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse vision response: {0}")]
    Parse(String),

    /// The model replied with no text.
    #[error("vision model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Timeout
        } else {
            AnalysisError::Request(e.to_string())
        }
    }
}

impl AnalysisError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::Auth(status),
            StatusCode::TOO_MANY_REQUESTS => AnalysisError::Quota,
            _ => AnalysisError::Status { status, body },
        }
    }
}

// ---------------------------------------------------------------------------
// VisionRequest
// ---------------------------------------------------------------------------

/// Everything the model receives for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionRequest {
    /// Fixed per-mode system instruction.
    pub system: String,
    /// The image as a `data:` URI.
    pub image_data_uri: String,
    /// Task-specific instruction placed after the image.
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// VisionBackend trait
// ---------------------------------------------------------------------------

/// Async boundary to a hosted vision-language model.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn VisionBackend>`.  The reply is plain natural-language text.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn complete(&self, request: &VisionRequest) -> Result<String, AnalysisError>;
}

// ---------------------------------------------------------------------------
// ChatVisionBackend
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/chat/completions` endpoint with an
/// `image_url` content part.
pub struct ChatVisionBackend {
    client: reqwest::Client,
    config: VisionConfig,
}

impl ChatVisionBackend {
    /// Build a backend from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &VisionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// JSON body for one request.
    pub fn build_body(&self, request: &VisionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": request.image_data_uri } },
                        { "type": "text", "text": request.prompt }
                    ]
                }
            ],
            "stream": false,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        })
    }
}

/// Pull the assistant text out of a chat-completions response.
pub fn parse_reply(json: &serde_json::Value) -> Result<String, AnalysisError> {
    let text = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(AnalysisError::EmptyResponse)?
        .trim();

    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl VisionBackend for ChatVisionBackend {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn complete(&self, request: &VisionRequest) -> Result<String, AnalysisError> {
        let mut req = self.client.post(self.endpoint()).json(&self.build_body(request));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::from_status(status, body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        parse_reply(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
