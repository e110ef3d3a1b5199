//! Session state and its lifecycle phases.
//!
//! [`SessionState`] is the single source of truth for one user session: the
//! current image, the cached analysis result and the cached audio artifact.
//! Only the [`Orchestrator`](super::Orchestrator) mutates it; everything else
//! reads it through the accessors.
//!
//! [`SessionPhase`] is derived from which fields are set:
//!
//! ```text
//! Empty ──upload──▶ ImageLoaded ──analyze ok──▶ ResultReady ──synthesize ok──▶ AudioReady
//!                        ▲   ▲                      │  ▲                          │
//!                        │   └──── upload ──────────┘  └── analyze / synthesize ──┤
//!                        └────────────────── upload ──────────────────────────────┘
//! ```

use crate::artifact::AudioArtifact;
use crate::image::{Image, ImageId};
use crate::vision::AnalysisMode;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a session stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No image uploaded yet.
    #[default]
    Empty,
    /// An image is loaded; no analysis result is cached.
    ImageLoaded,
    /// An analysis result is cached; no audio exists.
    ResultReady,
    /// A result and an audio artifact are both cached.
    AudioReady,
}

impl SessionPhase {
    /// Whether an analysis request is allowed in this phase.
    pub fn can_analyze(&self) -> bool {
        !matches!(self, SessionPhase::Empty)
    }

    /// Whether a synthesis request is allowed in this phase.
    pub fn can_synthesize(&self) -> bool {
        matches!(self, SessionPhase::ResultReady | SessionPhase::AudioReady)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Empty => "No image",
            SessionPhase::ImageLoaded => "Image loaded",
            SessionPhase::ResultReady => "Result ready",
            SessionPhase::AudioReady => "Audio ready",
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// The one cached analysis, and what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub image_id: ImageId,
    pub mode: AnalysisMode,
    pub text: String,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything one session remembers between user actions.
#[derive(Debug, Default)]
pub struct SessionState {
    image: Option<Image>,
    result: Option<AnalysisResult>,
    audio: Option<AudioArtifact>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.image, &self.result, &self.audio) {
            (None, _, _) => SessionPhase::Empty,
            (Some(_), None, _) => SessionPhase::ImageLoaded,
            (Some(_), Some(_), None) => SessionPhase::ResultReady,
            (Some(_), Some(_), Some(_)) => SessionPhase::AudioReady,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioArtifact> {
        self.audio.as_ref()
    }

    /// Install a new image, dropping the previous result and audio reference.
    pub(super) fn replace_image(&mut self, image: Image) -> &Image {
        self.result = None;
        self.audio = None;
        self.image.insert(image)
    }

    pub(super) fn replace_result(&mut self, result: AnalysisResult) -> &AnalysisResult {
        self.result.insert(result)
    }

    pub(super) fn replace_audio(&mut self, audio: AudioArtifact) -> &AudioArtifact {
        self.audio.insert(audio)
    }

    pub(super) fn take_audio(&mut self) -> Option<AudioArtifact> {
        self.audio.take()
    }

    pub(super) fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
