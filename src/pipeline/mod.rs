//! Persona pipeline — the show's sequencing logic.
//!
//! For each selected persona the pipeline asks the generation worker for a
//! topic, then a monologue, then hands the chunked monologue to the playback
//! engine.  A failed generation call skips the persona instead of stalling.
//!
//! # Architecture
//!
//! ```text
//!            Directive::Request                 GenerationRequest
//! PersonaPipeline ───────────────▶ StageApp ─────────────────────▶ GenerationWorker
//!       ▲                            │  ▲                                 │
//!       │ on_gateway()               │  └──────── GatewayMessage ─────────┘
//!       │ on_playback_finished()     │
//!       └────────────────────────────┤ Directive::Play
//!                                    ▼
//!                             PlaybackEngine ── PlaybackEvent::Finished
//! ```
//!
//! The pipeline itself is synchronous and holds no channels, so every
//! transition can be tested without a runtime.

pub mod runner;
pub mod state;

pub use runner::{Directive, PersonaPipeline, READY_IMAGE, STARTUP_IMAGE};
pub use state::PipelineState;
