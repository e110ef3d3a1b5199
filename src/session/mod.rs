//! Session lifecycle for Visionary.
//!
//! This module wires image upload, vision analysis and speech synthesis
//! around one explicit [`SessionState`].
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)
//!        │
//!        ▼
//! Orchestrator::run()  ← async tokio task, one command at a time
//!        │
//!        ├─ Upload      → validate, purge artifacts, reset state
//!        ├─ Analyze     → AnalysisEngine::analyze   → cache result
//!        └─ Synthesize  → purge audio, SpeechSynthesizer::synthesize → cache artifact
//!        │
//!        ▼
//! SessionEvent (mpsc) → UI
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use visionary::artifact::ArtifactStore;
//! use visionary::config::AppConfig;
//! use visionary::session::Orchestrator;
//! use visionary::speech::{DeepgramBackend, SpeechSynthesizer};
//! use visionary::vision::{AnalysisEngine, AnalysisMode, ChatVisionBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let engine = AnalysisEngine::new(Arc::new(ChatVisionBackend::from_config(&config.vision)));
//!     let synthesizer = SpeechSynthesizer::new(
//!         Arc::new(DeepgramBackend::from_config(&config.speech)),
//!         ArtifactStore::from_config(&config),
//!     );
//!     let mut session = Orchestrator::new(engine, synthesizer, config.session.clone());
//!
//!     session.upload("street.jpg", std::fs::read("street.jpg").unwrap()).unwrap();
//!     let result = session.analyze(AnalysisMode::ObjectDetection).await.unwrap();
//!     println!("{}", result.text);
//!     let audio = session.synthesize().await.unwrap();
//!     println!("audio at {}", audio.path().display());
//! }
//! ```

pub mod orchestrator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use orchestrator::{Orchestrator, SessionCommand, SessionError, SessionEvent};
pub use state::{AnalysisResult, SessionPhase, SessionState};
