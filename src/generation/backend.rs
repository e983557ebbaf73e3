//! Core `TextBackend` trait and the `ApiBackend` implementation.
//!
//! `ApiBackend` calls an OpenAI-compatible `/v1/completions` endpoint —
//! llama.cpp `llama-server`, LM Studio, vLLM, Ollama (OpenAI mode) — that
//! serves the model named by `model_path`.  All connection details come from
//! [`BackendConfig`]; nothing is hardcoded.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BackendConfig;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the generation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be initialised (no model configured or found).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),

    /// The response carried no `choices[0].text` field.
    #[error("backend response has no completion text")]
    EmptyResponse,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextBackend trait
// ---------------------------------------------------------------------------

/// Async trait for a text-generation backend.
///
/// Implementors must be `Send + Sync` so they can be shared with the worker
/// task behind an `Arc<dyn TextBackend>`.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Complete `prompt` using at most `max_tokens` tokens.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// ApiBackend
// ---------------------------------------------------------------------------

/// Completion client for a locally served model.
pub struct ApiBackend {
    client: reqwest::Client,
    config: BackendConfig,
    model: String,
}

impl ApiBackend {
    /// Initialise the backend for the model at `model_path`.
    ///
    /// # Errors
    ///
    /// [`BackendError::Unavailable`] when `model_path` is empty or does not
    /// exist on disk.
    pub fn connect(model_path: &str, config: &BackendConfig) -> Result<Self, BackendError> {
        let model_path = model_path.trim();
        if model_path.is_empty() {
            return Err(BackendError::Unavailable("no model_path configured".into()));
        }

        let path = Path::new(model_path);
        if !path.exists() {
            return Err(BackendError::Unavailable(format!(
                "model not found: {}",
                path.display()
            )));
        }

        let model = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Request(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            model,
        })
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "model":       self.model,
            "prompt":      prompt,
            "max_tokens":  max_tokens,
            "temperature": self.config.temperature,
            "top_p":       self.config.top_p,
            "stop":        self.config.stop,
            "stream":      false
        })
    }
}

#[async_trait]
impl TextBackend for ApiBackend {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError> {
        let url = format!(
            "{}/v1/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut req = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, max_tokens));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?.error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        parse_completion(&json)
    }
}

/// Extract `choices[0].text` from a completion response.
fn parse_completion(json: &serde_json::Value) -> Result<String, BackendError> {
    json["choices"][0]["text"]
        .as_str()
        .map(|text| text.trim().to_string())
        .ok_or(BackendError::EmptyResponse)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
