//! Long-lived generation worker.
//!
//! The UI loop must never block on a slow completion, so every backend call
//! runs on a tokio task.  Communication is strictly message passing:
//!
//! ```text
//! UI loop ──GenerationRequest──▶ GenerationWorker::run()
//!                                   ├─ GatewayMessage::Status      (once)
//!                                   └─ GatewayMessage::Generated   (or Error)
//! UI loop ◀──────────────────────────┘
//! ```
//!
//! Requests are processed strictly one at a time.  A call that panics is
//! reported as [`GatewayMessage::Error`]; a call that fails inside the
//! backend is already absorbed by the gateway's fallback.

use tokio::sync::mpsc;

use super::gateway::GenerationGateway;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// Work sent from the UI loop to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    /// Ask for a short topic phrase.
    Topic,
    /// Generate a monologue from a fully built prompt.
    Monologue { prompt: String, max_tokens: u32 },
}

/// Notifications delivered from the worker back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayMessage {
    /// Progress text for the status bar.
    Status(String),
    /// The generated (or fallback) text for the outstanding request.
    Generated(String),
    /// The outstanding request could not be completed at all.
    Error(String),
}

// ---------------------------------------------------------------------------
// GenerationWorker
// ---------------------------------------------------------------------------

/// Executes [`GenerationRequest`]s off the UI thread.
///
/// ```rust,no_run
/// use persona_stage::generation::{GenerationGateway, GenerationRequest, GenerationWorker};
///
/// # async fn example() {
/// let (request_tx, request_rx) = tokio::sync::mpsc::channel(4);
/// let (message_tx, mut message_rx) = tokio::sync::mpsc::channel(16);
///
/// let worker = GenerationWorker::new(GenerationGateway::new(None));
/// tokio::spawn(worker.run(request_rx, message_tx));
///
/// request_tx.send(GenerationRequest::Topic).await.unwrap();
/// while let Some(msg) = message_rx.recv().await {
///     println!("{msg:?}");
/// }
/// # }
/// ```
pub struct GenerationWorker {
    gateway: GenerationGateway,
}

impl GenerationWorker {
    pub fn new(gateway: GenerationGateway) -> Self {
        Self { gateway }
    }

    /// Serve requests until `request_rx` closes or the UI stops listening.
    pub async fn run(
        self,
        mut request_rx: mpsc::Receiver<GenerationRequest>,
        message_tx: mpsc::Sender<GatewayMessage>,
    ) {
        while let Some(request) = request_rx.recv().await {
            let status = match &request {
                GenerationRequest::Topic => "Choosing a topic…",
                GenerationRequest::Monologue { .. } => "Generating text…",
            };
            if message_tx
                .send(GatewayMessage::Status(status.into()))
                .await
                .is_err()
            {
                break;
            }

            let reply = self.execute(request).await;
            if message_tx.send(reply).await.is_err() {
                break;
            }
        }

        log::info!("generation worker: request channel closed, shutting down");
    }

    /// Run one request on its own task so a panic cannot take the worker
    /// down with it.
    async fn execute(&self, request: GenerationRequest) -> GatewayMessage {
        let gateway = self.gateway.clone();
        let task = tokio::spawn(async move {
            match request {
                GenerationRequest::Topic => gateway.request_topic().await,
                GenerationRequest::Monologue { prompt, max_tokens } => {
                    gateway.request_monologue(&prompt, max_tokens).await
                }
            }
        });

        match task.await {
            Ok(text) => GatewayMessage::Generated(text),
            Err(e) => {
                log::error!("generation worker: request task failed: {e}");
                GatewayMessage::Error(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backend::{BackendError, TextBackend};
    use crate::generation::fallback::fallback_text;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl TextBackend for Echo {
        async fn generate(&self, prompt: &str, _max: u32) -> Result<String, BackendError> {
            Ok(format!("echo {prompt}"))
        }
    }

    struct Panics;

    #[async_trait]
    impl TextBackend for Panics {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String, BackendError> {
            panic!("backend exploded");
        }
    }

    async fn run_requests(
        gateway: GenerationGateway,
        requests: Vec<GenerationRequest>,
    ) -> Vec<GatewayMessage> {
        let (request_tx, request_rx) = mpsc::channel(8);
        let (message_tx, mut message_rx) = mpsc::channel(32);

        for request in requests {
            request_tx.send(request).await.unwrap();
        }
        drop(request_tx);

        GenerationWorker::new(gateway).run(request_rx, message_tx).await;

        let mut messages = Vec::new();
        while let Some(msg) = message_rx.recv().await {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn each_request_gets_status_then_reply() {
        let gateway = GenerationGateway::new(Some(Arc::new(Echo)));
        let messages = run_requests(
            gateway,
            vec![
                GenerationRequest::Topic,
                GenerationRequest::Monologue {
                    prompt: "hello".into(),
                    max_tokens: 700,
                },
            ],
        )
        .await;

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], GatewayMessage::Status("Choosing a topic…".into()));
        assert!(matches!(messages[1], GatewayMessage::Generated(_)));
        assert_eq!(messages[2], GatewayMessage::Status("Generating text…".into()));
        assert_eq!(messages[3], GatewayMessage::Generated("echo hello".into()));
    }

    #[tokio::test]
    async fn unavailable_backend_still_generates() {
        let messages = run_requests(
            GenerationGateway::new(None),
            vec![GenerationRequest::Monologue {
                prompt: "p".into(),
                max_tokens: 700,
            }],
        )
        .await;

        assert_eq!(messages[1], GatewayMessage::Generated(fallback_text("p")));
    }

    #[tokio::test]
    async fn panicking_backend_reports_error_and_keeps_serving() {
        let gateway = GenerationGateway::new(Some(Arc::new(Panics)));
        let messages = run_requests(
            gateway,
            vec![GenerationRequest::Topic, GenerationRequest::Topic],
        )
        .await;

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[1], GatewayMessage::Error(_)));
        assert!(matches!(messages[3], GatewayMessage::Error(_)));
    }

    #[tokio::test]
    async fn worker_stops_when_ui_hangs_up() {
        let (request_tx, request_rx) = mpsc::channel(4);
        let (message_tx, message_rx) = mpsc::channel(4);
        drop(message_rx);

        request_tx.send(GenerationRequest::Topic).await.unwrap();
        // Returns even though request_tx is still open.
        GenerationWorker::new(GenerationGateway::new(None))
            .run(request_rx, message_tx)
            .await;
    }
}
