//! `SpeechBackend` trait and the Deepgram Aura implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Errors that can occur while turning text into an audio artifact.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// There was nothing to speak.
    #[error("no text to synthesise")]
    EmptyText,

    /// No API key is configured for the speech service.
    #[error("speech API key is not configured (set DEEPGRAM_API_KEY)")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("speech request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("speech request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("speech API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The service answered with zero bytes of audio.
    #[error("speech API returned no audio")]
    EmptyAudio,

    /// The audio could not be written to the artifact directory.
    #[error("could not write audio file: {0}")]
    Write(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechBackend trait
// ---------------------------------------------------------------------------

/// Async boundary to a hosted text-to-speech service.
///
/// Returns the encoded audio bytes; writing them to disk is the
/// synthesizer's job.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn speak(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

// ---------------------------------------------------------------------------
// DeepgramBackend
// ---------------------------------------------------------------------------

/// Deepgram Aura `/v1/speak` client with a fixed voice.
pub struct DeepgramBackend {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl DeepgramBackend {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Full request URL including the voice and encoding query.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/speak?model={}&encoding={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice,
            self.config.encoding
        )
    }
}

#[async_trait]
impl SpeechBackend for DeepgramBackend {
    async fn speak(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SynthesisError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::AUTHORIZATION, format!("Token {key}"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status { status, body });
        }

        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_carries_voice_and_encoding() {
        let backend = DeepgramBackend::from_config(&SpeechConfig::default());
        assert_eq!(
            backend.endpoint(),
            "https://api.deepgram.com/v1/speak?model=aura-zeus-en&encoding=mp3"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let backend = DeepgramBackend::from_config(&SpeechConfig::default());
        let err = backend.speak("hello").await.unwrap_err();
        assert!(matches!(err, SynthesisError::MissingApiKey));
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let config = SpeechConfig {
            api_key: Some(String::new()),
            ..SpeechConfig::default()
        };
        let backend = DeepgramBackend::from_config(&config);
        assert!(matches!(
            backend.speak("hello").await,
            Err(SynthesisError::MissingApiKey)
        ));
    }

    #[test]
    fn backend_is_object_safe() {
        let backend: Box<dyn SpeechBackend> =
            Box::new(DeepgramBackend::from_config(&SpeechConfig::default()));
        drop(backend);
    }
}
