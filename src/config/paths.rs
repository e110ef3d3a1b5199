//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\visionary\
//!   macOS:   ~/Library/Application Support/visionary/
//!   Linux:   ~/.config/visionary/
//!
//! Cache dir (temporary audio artifacts):
//!   Windows: %LOCALAPPDATA%\visionary\temp\
//!   macOS:   ~/Library/Caches/visionary/temp/
//!   Linux:   ~/.cache/visionary/temp/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory that holds the generated audio artifacts.
    pub artifact_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "visionary";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let artifact_dir = cache_dir.join("temp");

        Self {
            config_dir,
            settings_file,
            artifact_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
