//! Session orchestrator: drives upload → analyze → synthesize.
//!
//! [`Orchestrator`] owns the [`SessionState`] and is the only place where it
//! changes.  Each user action is one method call; [`Orchestrator::run`]
//! wraps them in a command loop for the UI.
//!
//! # Transitions
//!
//! ```text
//! upload(image)   validate → purge artifacts → image = new, result = None, audio = None
//! analyze(mode)   requires image; ok  → result = new  (stale audio discarded if configured)
//!                                 err → nothing changes
//! synthesize()    requires result; purge audio first, then
//!                                 ok  → audio = new
//!                                 err → audio stays None
//! shutdown/drop   best-effort purge of every artifact
//! ```
//!
//! Cleanup failures are logged and never abort a transition.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::artifact::{ArtifactStore, AudioArtifact, PurgeReport};
use crate::config::SessionConfig;
use crate::image::{Image, ImageFormat, ImageId, UploadError};
use crate::speech::{SpeechSynthesizer, SynthesisError};
use crate::vision::{AnalysisEngine, AnalysisError, AnalysisMode};

use super::state::{AnalysisResult, SessionPhase, SessionState};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Everything a user action can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("audio generation failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Analysis was requested before any image was uploaded.
    #[error("upload an image before running an analysis")]
    NoImage,

    /// Audio was requested before any analysis succeeded.
    #[error("run an analysis before asking for audio")]
    NoResult,
}

// ---------------------------------------------------------------------------
// Commands / events
// ---------------------------------------------------------------------------

/// User actions sent from the UI to the orchestrator.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// A new file was chosen (re-uploading the same file counts as new).
    Upload { name: String, bytes: Vec<u8> },
    /// Run an analysis of the current image.
    Analyze(AnalysisMode),
    /// Speak the current result.
    Synthesize,
    /// End the session and clean up.
    Shutdown,
}

/// Progress and results delivered from the orchestrator to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ImageLoaded {
        id: ImageId,
        name: String,
        format: ImageFormat,
        size: usize,
    },
    AnalysisStarted {
        mode: AnalysisMode,
    },
    AnalysisComplete {
        mode: AnalysisMode,
        text: String,
    },
    SynthesisStarted,
    AudioReady {
        path: PathBuf,
    },
    /// The previous audio artifact is gone; stop playing it.
    AudioCleared,
    /// A user action failed; the session is still usable.
    Error {
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Coordinates the analysis engine, the speech synthesizer and the artifact
/// store around one [`SessionState`].
pub struct Orchestrator {
    state: SessionState,
    engine: AnalysisEngine,
    synthesizer: SpeechSynthesizer,
    store: ArtifactStore,
    config: SessionConfig,
}

impl Orchestrator {
    /// Create an orchestrator with an empty session.
    ///
    /// Leftover artifacts from an earlier run are purged so the directory
    /// starts out empty.
    pub fn new(engine: AnalysisEngine, synthesizer: SpeechSynthesizer, config: SessionConfig) -> Self {
        let store = synthesizer.store().clone();
        store.purge_all();
        Self {
            state: SessionState::new(),
            engine,
            synthesizer,
            store,
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Accept a new image and reset the session around it.
    ///
    /// Rejected uploads leave the session untouched.
    pub fn upload(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<&Image, SessionError> {
        let image = Image::from_bytes(name, bytes)?;
        Ok(self.reset_with(image))
    }

    /// Install an already validated image and reset the session around it.
    pub fn reset_with(&mut self, image: Image) -> &Image {
        log::info!(
            "session: new image {} '{}' ({}, {} bytes)",
            image.id(),
            image.name(),
            image.format().label(),
            image.size()
        );
        self.discard_audio();
        self.state.replace_image(image)
    }

    /// Analyse the current image under `mode`.
    ///
    /// On success the new text replaces any cached result, whatever mode
    /// produced it.  On failure nothing changes.
    pub async fn analyze(&mut self, mode: AnalysisMode) -> Result<&AnalysisResult, SessionError> {
        let image = self.state.image().ok_or(SessionError::NoImage)?;
        let image_id = image.id();

        let text = match self.engine.analyze(image, mode).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("session: {mode} analysis of image {image_id} failed: {e}");
                return Err(e.into());
            }
        };

        log::info!(
            "session: {mode} analysis of image {image_id} complete ({} chars)",
            text.len()
        );

        if self.config.discard_audio_on_reanalysis {
            self.discard_audio();
        }

        Ok(self.state.replace_result(AnalysisResult {
            image_id,
            mode,
            text,
        }))
    }

    /// Speak the current result, replacing any previous audio.
    ///
    /// The old artifact is purged before the call so at most one artifact
    /// file exists at any time.  On failure the session has no audio.
    pub async fn synthesize(&mut self) -> Result<&AudioArtifact, SessionError> {
        if self.state.result().is_none() {
            return Err(SessionError::NoResult);
        }

        self.discard_audio();

        let text = match self.state.result() {
            Some(result) => result.text.as_str(),
            None => return Err(SessionError::NoResult),
        };

        match self.synthesizer.synthesize(text).await {
            Ok(artifact) => {
                log::info!("session: audio ready at {}", artifact.path().display());
                Ok(self.state.replace_audio(artifact))
            }
            Err(e) => {
                log::warn!("session: synthesis failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Delete every artifact on disk and forget the audio reference if its
    /// file is gone.  Safe to call any number of times.
    pub fn purge_artifacts(&mut self) -> PurgeReport {
        let report = self.store.purge_all();
        if self.state.audio().is_some_and(|audio| !audio.exists()) {
            self.state.take_audio();
        }
        report
    }

    /// End the session: purge artifacts and drop all cached state.
    pub fn shutdown(&mut self) {
        let report = self.purge_artifacts();
        self.state.clear();
        log::info!(
            "session: shut down ({} artifact(s) removed, {} failure(s))",
            report.removed,
            report.failures.len()
        );
    }

    /// Remove the current artifact and sweep any strays, then clear the
    /// reference.  Failures are warnings only.
    fn discard_audio(&mut self) {
        if let Some(audio) = self.state.take_audio() {
            if let Err(e) = self.store.delete_one(&audio) {
                log::warn!("session: {e}");
            }
        }
        self.store.purge_all();
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    /// Serve commands until `commands` closes or `Shutdown` arrives, then
    /// clean up.  One command is handled at a time.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Sender<SessionEvent>,
    ) {
        while let Some(command) = commands.recv().await {
            if matches!(command, SessionCommand::Shutdown) {
                break;
            }
            for event in self.handle(command).await {
                let _ = events.send(event).await;
            }
        }

        self.shutdown();
    }

    /// Apply one command and describe what happened.
    pub async fn handle(&mut self, command: SessionCommand) -> Vec<SessionEvent> {
        let audio_before = self.state.audio().cloned();
        let mut out = Vec::new();

        match command {
            SessionCommand::Upload { name, bytes } => match self.upload(name, bytes) {
                Ok(image) => out.push(SessionEvent::ImageLoaded {
                    id: image.id(),
                    name: image.name().to_string(),
                    format: image.format(),
                    size: image.size(),
                }),
                Err(e) => out.push(error_event(e)),
            },

            SessionCommand::Analyze(mode) => {
                out.push(SessionEvent::AnalysisStarted { mode });
                match self.analyze(mode).await {
                    Ok(result) => out.push(SessionEvent::AnalysisComplete {
                        mode: result.mode,
                        text: result.text.clone(),
                    }),
                    Err(e) => out.push(error_event(e)),
                }
            }

            SessionCommand::Synthesize => {
                out.push(SessionEvent::SynthesisStarted);
                match self.synthesize().await {
                    Ok(artifact) => out.push(SessionEvent::AudioReady {
                        path: artifact.path().to_path_buf(),
                    }),
                    Err(e) => out.push(error_event(e)),
                }
            }

            SessionCommand::Shutdown => self.shutdown(),
        }

        if audio_before.is_some() && self.state.audio() != audio_before.as_ref() {
            // Must reach the UI before the outcome of the command.
            let at = out
                .iter()
                .position(|e| {
                    matches!(e, SessionEvent::AudioReady { .. } | SessionEvent::Error { .. })
                })
                .unwrap_or(out.len());
            out.insert(at, SessionEvent::AudioCleared);
        }
        out
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.store.purge_all();
    }
}

fn error_event(e: SessionError) -> SessionEvent {
    log::error!("session error: {e}");
    SessionEvent::Error {
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
