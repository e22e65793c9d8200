//! Text-to-speech through the Hugging Face inference API
//!
//! Cold models answer 503 with an `estimated_time` while they load; only that
//! response is retried, waiting the advertised time up to a cap.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::config::SpeechConfig;
use crate::error::{Error, Result};

const DEFAULT_LOADING_WAIT: Duration = Duration::from_millis(2500);
const MAX_LOADING_WAIT: Duration = Duration::from_secs(8);

/// Trait for speech synthesis
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text` with `model`, returning WAV bytes
    async fn synthesize(&self, text: &str, model: &str) -> Result<Bytes>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// How long to wait before retrying a 503 "model loading" response
pub fn loading_wait(body: &str) -> Duration {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("estimated_time").and_then(|t| t.as_f64()))
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| Duration::from_secs_f64(secs).min(MAX_LOADING_WAIT))
        .unwrap_or(DEFAULT_LOADING_WAIT)
}

/// Hugging Face TTS client with an allowlist of models
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    allowed_models: Vec<String>,
    api_key: Option<String>,
    max_chars: usize,
    max_attempts: u32,
}

impl SpeechSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build speech HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            allowed_models: config.allowed_models.clone(),
            api_key: config.api_key.clone(),
            max_chars: config.max_chars,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Validate a request and return the text that will be sent
    fn prepare(&self, text: &str, model: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_input("text is required"));
        }
        if !self.allowed_models.iter().any(|m| m == model) {
            return Err(Error::invalid_input(format!(
                "Invalid model. Use {}",
                self.allowed_models.join(" or ")
            )));
        }
        Ok(text.chars().take(self.max_chars).collect())
    }
}

#[async_trait]
impl SpeechProvider for SpeechSynthesizer {
    async fn synthesize(&self, text: &str, model: &str) -> Result<Bytes> {
        let text = self.prepare(text, model)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Missing HUGGINGFACE_API_KEY or HF_API_KEY".into()))?;
        let url = format!("{}/{}", self.endpoint, model);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .header(reqwest::header::ACCEPT, "audio/wav")
                .body(text.clone())
                .send()
                .await
                .map_err(|e| Error::Speech(format!("request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                let is_json = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.contains("application/json"));
                if is_json {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Speech(format!("non-audio response: {}", body)));
                }
                return response
                    .bytes()
                    .await
                    .map_err(|e| Error::Speech(format!("failed to read audio: {}", e)));
            }

            let body = response.text().await.unwrap_or_default();
            if status != reqwest::StatusCode::SERVICE_UNAVAILABLE || attempt >= self.max_attempts {
                return Err(Error::Speech(format!("{} {}", status.as_u16(), body)));
            }

            let wait = loading_wait(&body);
            tracing::info!(
                "Speech model {} loading, retrying in {:?} (attempt {}/{})",
                model,
                wait,
                attempt,
                self.max_attempts
            );
            tokio::time::sleep(wait).await;
        }
    }

    fn name(&self) -> &str {
        "huggingface-tts"
    }
}
