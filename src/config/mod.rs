//! Configuration module for Visionary.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ArtifactConfig, SessionConfig, SpeechConfig, UiConfig, VisionConfig,
    GOOGLE_API_KEY_ENV, SPEECH_API_KEY_ENV, VISION_API_KEY_ENV,
};
