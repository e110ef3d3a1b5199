//! `SpeechSynthesizer` — text in, audio artifact out.
//!
//! [`MockSpeechBackend`] (available under `#[cfg(test)]`) returns scripted
//! audio bytes and counts calls.

use std::sync::Arc;

use crate::artifact::{ArtifactStore, AudioArtifact};
use crate::speech::backend::{SpeechBackend, SynthesisError};

/// Speaks text through a [`SpeechBackend`] and stores the result as a new,
/// uniquely named artifact.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    store: ArtifactStore,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, store: ArtifactStore) -> Self {
        Self { backend, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// One synthesis call.  Nothing is written unless the backend succeeds.
    pub async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let audio = self.backend.speak(text).await?;

        self.store
            .write(&audio)
            .map_err(|e| SynthesisError::Write(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockSpeechBackend  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub struct MockSpeechBackend {
    /// Replies in call order; the last one repeats.
    replies: Vec<Result<Vec<u8>, SynthesisError>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSpeechBackend {
    pub fn scripted(replies: Vec<Result<Vec<u8>, SynthesisError>>) -> Self {
        assert!(!replies.is_empty(), "script at least one reply");
        Self {
            replies,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn ok(audio: &[u8]) -> Self {
        Self::scripted(vec![Ok(audio.to_vec())])
    }

    pub fn err(error: SynthesisError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl SpeechBackend for MockSpeechBackend {
    async fn speak(&self, _text: &str) -> Result<Vec<u8>, SynthesisError> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.replies[n.min(self.replies.len() - 1)].clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn synthesizer(backend: Arc<MockSpeechBackend>, dir: &std::path::Path) -> SpeechSynthesizer {
        SpeechSynthesizer::new(backend, ArtifactStore::new(dir.join("temp"), "description_", "mp3"))
    }

    #[tokio::test]
    async fn writes_audio_to_a_fresh_file() {
        let dir = tempdir().unwrap();
        let synth = synthesizer(Arc::new(MockSpeechBackend::ok(b"ID3audio")), dir.path());

        let a = synth.synthesize("hello").await.unwrap();
        let b = synth.synthesize("hello").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(std::fs::read(a.path()).unwrap(), b"ID3audio");
        assert_eq!(synth.store().list().len(), 2);
    }

    #[tokio::test]
    async fn empty_text_never_reaches_backend() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(MockSpeechBackend::ok(b"x"));
        let synth = synthesizer(backend.clone(), dir.path());

        assert!(matches!(
            synth.synthesize("  \n").await,
            Err(SynthesisError::EmptyText)
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn backend_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let synth = synthesizer(
            Arc::new(MockSpeechBackend::err(SynthesisError::Timeout)),
            dir.path(),
        );

        assert!(matches!(
            synth.synthesize("hello").await,
            Err(SynthesisError::Timeout)
        ));
        assert!(synth.store().list().is_empty());
    }

    #[tokio::test]
    async fn unwritable_directory_is_a_write_error() {
        let dir = tempdir().unwrap();
        // A regular file where the artifact directory should be.
        let blocker = dir.path().join("temp");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let synth = synthesizer(Arc::new(MockSpeechBackend::ok(b"x")), dir.path());
        assert!(matches!(
            synth.synthesize("hello").await,
            Err(SynthesisError::Write(_))
        ));
    }
}
