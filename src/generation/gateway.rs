//! `GenerationGateway` — the never-failing façade over a [`TextBackend`].
//!
//! When the backend is missing, or any call to it fails, the gateway returns
//! [`fallback_text`] instead of propagating the error.  A reply that arrives
//! is passed through trimmed, blank or not; topic sanitising and the
//! pipeline decide what an empty reply means.

use std::sync::Arc;

use crate::config::AppConfig;

use super::backend::{ApiBackend, TextBackend};
use super::fallback::fallback_text;
use super::topic::{random_default_topic, sanitize_topic, TOPIC_MAX_TOKENS, TOPIC_PROMPT};

// ---------------------------------------------------------------------------
// GenerationGateway
// ---------------------------------------------------------------------------

/// Issues topic and monologue requests against an optional backend.
///
/// # Example
/// ```rust
/// use persona_stage::generation::GenerationGateway;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // No backend → deterministic fallback text.
/// let gateway = GenerationGateway::new(None);
/// assert!(!gateway.available());
/// let text = gateway.request_monologue("Topic: tides", 700).await;
/// assert!(!text.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct GenerationGateway {
    backend: Option<Arc<dyn TextBackend>>,
    available: bool,
}

impl GenerationGateway {
    /// Wrap `backend`; `None` means fallback mode for the whole run.
    pub fn new(backend: Option<Arc<dyn TextBackend>>) -> Self {
        let available = backend.is_some();
        Self { backend, available }
    }

    /// Build the gateway from config, connecting an [`ApiBackend`] when a
    /// model is configured.  Initialisation failure is logged, not returned.
    pub fn from_config(config: &AppConfig) -> Self {
        match ApiBackend::connect(&config.model_path, &config.backend) {
            Ok(backend) => {
                log::info!(
                    "generation: backend ready (model '{}' at {})",
                    backend.model(),
                    config.backend.base_url
                );
                Self::new(Some(Arc::new(backend)))
            }
            Err(e) => {
                log::warn!("generation: {e}; using fallback text");
                Self::new(None)
            }
        }
    }

    /// Whether the backend initialised.  Fixed at construction.
    pub fn available(&self) -> bool {
        self.available
    }

    /// Generate text for `prompt`.  Never fails.
    ///
    /// A successful backend reply is returned trimmed, even when blank; the
    /// fallback text is used only when the backend is missing or errors.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> String {
        let Some(backend) = &self.backend else {
            return fallback_text(prompt);
        };

        match backend.generate(prompt, max_tokens).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::warn!("generation: backend call failed ({e}), using fallback");
                fallback_text(prompt)
            }
        }
    }

    /// Ask for one short topic and sanitise it.
    ///
    /// Always non-empty, whitespace-collapsed, free of punctuation other than
    /// `-`, and at most 64 characters.
    pub async fn request_topic(&self) -> String {
        let raw = self.generate(TOPIC_PROMPT, TOPIC_MAX_TOKENS).await;
        sanitize_topic(&raw).unwrap_or_else(|| {
            let topic = random_default_topic();
            log::debug!("generation: topic output sanitised to nothing, using '{topic}'");
            topic
        })
    }

    /// Generate the monologue for a fully built prompt.
    pub async fn request_monologue(&self, prompt: &str, max_tokens: u32) -> String {
        self.generate(prompt, max_tokens).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
