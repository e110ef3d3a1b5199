//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! API keys are usually kept out of the file and supplied through the
//! environment instead; see [`AppConfig::apply_env_overrides`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable holding the vision model API key.
pub const VISION_API_KEY_ENV: &str = "VISIONARY_VISION_API_KEY";
/// Fallback environment variable for the vision key (Gemini convention).
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the Deepgram speech API key.
pub const SPEECH_API_KEY_ENV: &str = "DEEPGRAM_API_KEY";

// ---------------------------------------------------------------------------
// VisionConfig
// ---------------------------------------------------------------------------

/// Settings for the vision-language model used by the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Base URL of an OpenAI-compatible API, including its version segment.
    /// `/chat/completions` is appended to it.
    ///
    /// - Gemini (default): `https://generativelanguage.googleapis.com/v1beta/openai`
    /// - OpenAI: `https://api.openai.com/v1`
    /// - Ollama: `http://localhost:11434/v1`
    pub base_url: String,
    /// API key, `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gemini-1.5-flash"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Upper bound on the length of the model's reply.
    pub max_tokens: u32,
    /// Maximum seconds to wait for a reply before timing out.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            api_key: None,
            model: "gemini-1.5-flash".into(),
            temperature: 0.4,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the text-to-speech service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of the Deepgram API.
    pub base_url: String,
    /// Deepgram API key.
    pub api_key: Option<String>,
    /// Voice / model identifier (e.g. `"aura-zeus-en"`).
    pub voice: String,
    /// Output audio encoding requested from the service.
    pub encoding: String,
    /// Maximum seconds to wait for the audio before timing out.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepgram.com".into(),
            api_key: None,
            voice: "aura-zeus-en".into(),
            encoding: "mp3".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactConfig
// ---------------------------------------------------------------------------

/// Where and how generated audio files are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory override.  `None` uses [`AppPaths::artifact_dir`].
    pub dir: Option<PathBuf>,
    /// File name prefix of every artifact.  Only files carrying this prefix
    /// and [`extension`](Self::extension) are ever purged.
    pub prefix: String,
    /// File extension of every artifact (without the dot).
    pub extension: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "description_".into(),
            extension: "mp3".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Session lifecycle behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delete the current audio artifact when a re-analysis succeeds, so the
    /// audio never describes an older result.
    pub discard_audio_on_reanalysis: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discard_audio_on_reanalysis: true,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Start playback as soon as a new audio artifact is ready.
    pub auto_play: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (640.0, 560.0),
            auto_play: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use visionary::config::AppConfig;
///
/// // Load (returns Default when file is missing), then layer env keys on top.
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Vision-language model settings.
    pub vision: VisionConfig,
    /// Text-to-speech settings.
    pub speech: SpeechConfig,
    /// Audio artifact storage.
    pub artifacts: ArtifactConfig,
    /// Session lifecycle behaviour.
    pub session: SessionConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay API keys from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay API keys using an arbitrary lookup (useful for tests).
    ///
    /// Empty values are ignored so an exported-but-blank variable never
    /// wipes a key from the settings file.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(VISION_API_KEY_ENV).or_else(|| non_empty(GOOGLE_API_KEY_ENV)) {
            self.vision.api_key = Some(key);
        }
        if let Some(key) = non_empty(SPEECH_API_KEY_ENV) {
            self.speech.api_key = Some(key);
        }
    }

    /// Resolved artifact directory: the configured override or the platform
    /// cache location.
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifacts
            .dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().artifact_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
