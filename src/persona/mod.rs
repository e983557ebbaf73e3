//! Persona definitions and per-run persona state.
//!
//! A [`Persona`] is the immutable, validated form of a
//! [`PersonaConfig`](crate::config::PersonaConfig).  [`PersonaState`] is the
//! mutable record the pipeline fills in as generation responses arrive.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{BalloonConfig, PersonaConfig};

/// Smallest chunk word budget the pipeline will use for any persona.
pub const MIN_WORDS_PER_CHUNK: usize = 40;

// ---------------------------------------------------------------------------
// BalloonRect
// ---------------------------------------------------------------------------

/// Balloon rectangle in design-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalloonRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BalloonRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for BalloonRect {
    fn default() -> Self {
        BalloonConfig::default().into()
    }
}

impl From<BalloonConfig> for BalloonRect {
    fn from(b: BalloonConfig) -> Self {
        Self::new(b.x_pos, b.y_pos, b.width, b.height)
    }
}

// ---------------------------------------------------------------------------
// PersonaError
// ---------------------------------------------------------------------------

/// Reasons a persona cannot take its turn.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PersonaError {
    #[error("persona '{0}' has no voice description")]
    MissingVoice(String),

    #[error("persona '{name}' has an empty speech balloon ({width}x{height})")]
    EmptyBalloon { name: String, width: f32, height: f32 },
}

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// A configured voice driving one generation-and-playback turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub name: String,
    pub display_name: String,
    pub image_file_name: String,
    pub voice: String,
    pub style_rules: Vec<String>,
    pub examples: Vec<String>,
    pub balloon: BalloonRect,
    pub max_words_per_chunk: usize,
}

impl Persona {
    /// Name for the status bar: `display_name`, else `name`, else `"?"`.
    pub fn label(&self) -> &str {
        [self.display_name.as_str(), self.name.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("?")
    }

    /// Word budget handed to the chunker.
    pub fn chunk_word_budget(&self) -> usize {
        self.max_words_per_chunk.max(MIN_WORDS_PER_CHUNK)
    }

    /// Background image path under `assets_dir`, if one is configured.
    pub fn background_path(&self, assets_dir: &Path) -> Option<PathBuf> {
        let file = self.image_file_name.trim();
        (!file.is_empty()).then(|| assets_dir.join(file))
    }

    /// Reject personas that cannot be performed.
    pub fn validate(&self) -> Result<(), PersonaError> {
        if self.voice.trim().is_empty() {
            return Err(PersonaError::MissingVoice(self.label().to_string()));
        }
        if self.balloon.width <= 0.0 || self.balloon.height <= 0.0 {
            return Err(PersonaError::EmptyBalloon {
                name: self.label().to_string(),
                width: self.balloon.width,
                height: self.balloon.height,
            });
        }
        Ok(())
    }
}

impl From<&PersonaConfig> for Persona {
    fn from(cfg: &PersonaConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            display_name: cfg.display_name.clone(),
            image_file_name: cfg.image_file_name.clone(),
            voice: cfg.prompt_persona.trim().to_string(),
            style_rules: cfg.style_rules.clone(),
            examples: cfg.examples.clone(),
            balloon: cfg.speech_balloon.into(),
            max_words_per_chunk: cfg.max_words_per_chunk,
        }
    }
}

// ---------------------------------------------------------------------------
// PersonaState
// ---------------------------------------------------------------------------

/// Mutable per-run record: the persona plus what has been generated for it.
#[derive(Debug, Clone)]
pub struct PersonaState {
    pub persona: Persona,
    /// Sanitised topic; empty until the topic response arrives.
    pub topic: String,
    /// Monologue text; empty until the monologue response arrives.
    pub text: String,
}

impl PersonaState {
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            topic: String::new(),
            text: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
