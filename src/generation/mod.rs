//! Text generation: backend, never-failing gateway, and worker task.
//!
//! This module provides:
//! * [`TextBackend`] — async trait implemented by generation backends.
//! * [`ApiBackend`] — OpenAI-compatible completion client for a served model.
//! * [`GenerationGateway`] — topic/monologue requests with deterministic
//!   fallback text; never surfaces a backend failure.
//! * [`GenerationWorker`] — long-lived task answering [`GenerationRequest`]s
//!   with [`GatewayMessage`]s over `tokio::sync::mpsc` channels.
//! * [`build_monologue_prompt`] and the topic prompt/sanitiser.

pub mod backend;
pub mod fallback;
pub mod gateway;
pub mod prompt;
pub mod topic;
pub mod worker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backend::{ApiBackend, BackendError, TextBackend};
pub use fallback::fallback_text;
pub use gateway::GenerationGateway;
pub use prompt::{build_monologue_prompt, END_MARKER, MONOLOGUE_MAX_TOKENS};
pub use topic::{sanitize_topic, DEFAULT_TOPICS, TOPIC_PROMPT};
pub use worker::{GatewayMessage, GenerationRequest, GenerationWorker};
