//! Text-to-speech for analysis results.
//!
//! * [`SpeechBackend`] — async trait implemented by every speech client.
//! * [`DeepgramBackend`] — Deepgram Aura REST client with a fixed voice.
//! * [`SpeechSynthesizer`] — speaks text and stores it as an [`AudioArtifact`](crate::artifact::AudioArtifact).
//! * [`SynthesisError`] — error variants for speech calls.

pub mod backend;
pub mod synthesizer;

pub use backend::{DeepgramBackend, SpeechBackend, SynthesisError};
pub use synthesizer::SpeechSynthesizer;

#[cfg(test)]
pub use synthesizer::MockSpeechBackend;
