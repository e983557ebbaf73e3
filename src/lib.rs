//! Persona stage — LLM-voiced personas performing monologues in a speech
//! balloon over a background image.
//!
//! ```text
//! config ──▶ PersonaPipeline ──requests──▶ GenerationWorker ──▶ GenerationGateway
//!                 │    ▲                         │                  (backend or fallback)
//!                 │    └──────── messages ───────┘
//!                 ▼
//!            chunk::split_into_chunks ──▶ PlaybackEngine ──▶ StageApp (egui)
//! ```

pub mod app;
pub mod chunk;
pub mod config;
pub mod generation;
pub mod persona;
pub mod pipeline;
pub mod playback;
