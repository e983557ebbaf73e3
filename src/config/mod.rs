//! Configuration module.
//!
//! Provides [`AppConfig`] (top-level settings), typed sub-configs for the UI,
//! the generation backend and each persona, [`AppPaths`] for the platform
//! config directory, and YAML/TOML persistence via `AppConfig::load_from` /
//! `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, BackendConfig, BalloonConfig, ConfigError, PersonaConfig, UiConfig,
};
