//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir:
//!   Windows: %APPDATA%\persona-stage\
//!   macOS:   ~/Library/Application Support/persona-stage/
//!   Linux:   ~/.config/persona-stage/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `config.yaml`.
    pub config_dir: PathBuf,
    /// Full path to `config.yaml`.
    pub config_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "persona-stage";

    /// File name looked up in the working directory and the config dir.
    pub const CONFIG_FILE_NAME: &'static str = "config.yaml";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        let config_file = config_dir.join(Self::CONFIG_FILE_NAME);

        Self {
            config_dir,
            config_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
