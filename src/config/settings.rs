//! Application settings structs, defaults, validation and file persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`.
//! Every recognised option is a named field with a serde default, so a
//! config file only needs to mention what it changes.
//!
//! The on-disk format is YAML (`config.yaml`); a path ending in `.toml` is
//! read and written as TOML instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Values that parse but cannot be used.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The design-space reference resolution must be non-zero.
    #[error("ui.screen_width and ui.screen_height must be > 0 (got {width}x{height})")]
    ZeroDesignSize { width: u32, height: u32 },
}

// ---------------------------------------------------------------------------
// BalloonConfig
// ---------------------------------------------------------------------------

/// Speech-balloon rectangle in design-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonConfig {
    pub x_pos: f32,
    pub y_pos: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for BalloonConfig {
    fn default() -> Self {
        Self {
            x_pos: 80.0,
            y_pos: 80.0,
            width: 864.0,
            height: 560.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PersonaConfig
// ---------------------------------------------------------------------------

/// One entry of the `personalities` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Internal identifier.
    pub name: String,
    /// Name shown in the status bar; falls back to `name` when empty.
    pub display_name: String,
    /// Background image, relative to the assets directory.
    pub image_file_name: String,
    /// Voice description injected at the top of the monologue prompt.
    pub prompt_persona: String,
    pub style_rules: Vec<String>,
    pub examples: Vec<String>,
    /// Word budget per displayed chunk (the pipeline enforces a floor of 40).
    pub max_words_per_chunk: usize,
    pub speech_balloon: BalloonConfig,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            image_file_name: String::new(),
            prompt_persona: String::new(),
            style_rules: Vec::new(),
            examples: Vec::new(),
            max_words_per_chunk: 120,
            speech_balloon: BalloonConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection settings for the completion server that hosts `model_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of an OpenAI-compatible completion server
    /// (e.g. llama.cpp `llama-server`).
    pub base_url: String,
    /// Bearer token — `None` for local servers.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    /// Maximum seconds to wait for a single completion.
    pub timeout_secs: u64,
    /// Stop sequences sent with every request.
    pub stop: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            api_key: None,
            temperature: 0.8,
            top_p: 0.95,
            timeout_secs: 120,
            stop: vec!["</END>".into(), "###".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window, timing and balloon appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Design-space width; balloon rectangles are expressed against it.
    pub screen_width: u32,
    /// Design-space height.
    pub screen_height: u32,
    /// Seconds each chunk is held fully visible.
    pub chunk_duration_s: u64,
    /// Duration of each fade, in and out.
    pub fade_ms: u64,
    pub window_title: String,
    pub font_family: String,
    pub font_point_size: f32,
    pub balloon_rounding_px: u8,
    /// Balloon background alpha (0.0 – 1.0).
    pub balloon_opacity: f32,
    /// Status bar text colour as `#rrggbb`; anything else uses the theme.
    pub status_style: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            screen_width: 1024,
            screen_height: 768,
            chunk_duration_s: 30,
            fade_ms: 600,
            window_title: "LLM Streamer".into(),
            font_family: "DejaVu Sans".into(),
            font_point_size: 16.0,
            balloon_rounding_px: 24,
            balloon_opacity: 0.96,
            status_style: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, read from `config.yaml`.
///
/// ```rust,no_run
/// use persona_stage::config::AppConfig;
///
/// // Missing file → defaults
/// let config = AppConfig::load().unwrap();
/// assert!(config.num_characters >= 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model artifact served by the backend.  Empty ⇒ fallback text only.
    pub model_path: String,
    /// Number of personas performed this session.
    pub num_characters: usize,
    /// Directory background images are resolved in.
    pub assets_dir: PathBuf,
    pub personalities: Vec<PersonaConfig>,
    pub ui: UiConfig,
    pub backend: BackendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            num_characters: 1,
            assets_dir: PathBuf::from("assets"),
            personalities: Vec::new(),
            ui: UiConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `./config.yaml` when present, otherwise from the platform
    /// config directory.  A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let local = Path::new(AppPaths::CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(local);
        }
        Self::load_from(&AppPaths::new().config_file)
    }

    /// Load and validate from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut config: Self = if is_toml(path) {
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_yaml_ng::to_string(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check and normalise values once, right after loading.
    ///
    /// Out-of-range values that have an obvious repair are clamped with a
    /// warning; values with no sensible repair are rejected.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.ui.screen_width == 0 || self.ui.screen_height == 0 {
            return Err(ConfigError::ZeroDesignSize {
                width: self.ui.screen_width,
                height: self.ui.screen_height,
            });
        }

        if self.num_characters < 1 {
            log::warn!("config: num_characters = 0, clamping to 1");
            self.num_characters = 1;
        }

        if !(0.0..=1.0).contains(&self.ui.balloon_opacity) {
            log::warn!(
                "config: balloon_opacity {} out of range, clamping",
                self.ui.balloon_opacity
            );
            self.ui.balloon_opacity = self.ui.balloon_opacity.clamp(0.0, 1.0);
        }

        for (index, persona) in self.personalities.iter().enumerate() {
            if persona.name.trim().is_empty() && persona.display_name.trim().is_empty() {
                log::warn!("config: personality #{index} has no name, shown as '?'");
            }
        }

        Ok(())
    }

    /// `true` when a backend model has been configured.
    pub fn has_model(&self) -> bool {
        !self.model_path.trim().is_empty()
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
