//! Audio playback with a real progress stream.
//!
//! [`play`] decodes an artifact on a dedicated thread (rodio output streams
//! are not `Send`) and reports [`PlaybackEvent`]s as the sink actually
//! advances.  The file is read into memory up front, so the artifact can be
//! deleted while it is still playing.  Dropping or stopping the
//! [`PlaybackHandle`] cancels playback.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;

/// How often the playback thread reports progress.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// PlaybackError / PlaybackEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("could not read audio file: {0}")]
    Read(String),

    #[error("could not start playback thread: {0}")]
    Spawn(String),
}

/// What the playback thread reports.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Audio is playing; `total` is `None` when the container does not say.
    Started { total: Option<Duration> },
    Progress {
        elapsed: Duration,
        total: Option<Duration>,
    },
    /// Reached the end of the audio.
    Finished,
    /// Cancelled through the handle.
    Stopped,
    /// No output device, or the audio could not be decoded.
    Failed(String),
}

impl PlaybackEvent {
    /// Whether no further events will follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::Finished | PlaybackEvent::Stopped | PlaybackEvent::Failed(_)
        )
    }
}

/// Fraction of `total` covered by `elapsed`, clamped to `0.0..=1.0`.
pub fn progress_fraction(elapsed: Duration, total: Option<Duration>) -> Option<f32> {
    let total = total.filter(|t| !t.is_zero())?;
    Some((elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0))
}

// ---------------------------------------------------------------------------
// PlaybackHandle
// ---------------------------------------------------------------------------

/// Owner's end of one playback.
pub struct PlaybackHandle {
    events: Receiver<PlaybackEvent>,
    cancel: Arc<AtomicBool>,
    done: bool,
}

impl PlaybackHandle {
    /// Next pending event, without blocking.
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        if self.done {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => {
                if event.is_terminal() {
                    self.done = true;
                }
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                None
            }
        }
    }

    /// Ask the playback thread to stop.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

/// Start playing the audio file at `path`.
pub fn play(path: &Path, tick: Duration) -> Result<PlaybackHandle, PlaybackError> {
    let bytes = std::fs::read(path).map_err(|e| PlaybackError::Read(e.to_string()))?;

    let (tx, rx) = mpsc::channel::<PlaybackEvent>();
    let cancel = Arc::new(AtomicBool::new(false));
    let thread_cancel = Arc::clone(&cancel);

    thread::Builder::new()
        .name("audio-playback".into())
        .spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = tx.send(PlaybackEvent::Failed(format!("no audio output: {e}")));
                    return;
                }
            };
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = tx.send(PlaybackEvent::Failed(format!("audio sink: {e}")));
                    return;
                }
            };
            let source = match Decoder::new(Cursor::new(bytes)) {
                Ok(source) => source,
                Err(e) => {
                    let _ = tx.send(PlaybackEvent::Failed(format!("undecodable audio: {e}")));
                    return;
                }
            };

            let total = source.total_duration();
            sink.append(source);
            let _ = tx.send(PlaybackEvent::Started { total });

            loop {
                if thread_cancel.load(Ordering::SeqCst) {
                    sink.stop();
                    let _ = tx.send(PlaybackEvent::Stopped);
                    break;
                }
                if sink.empty() {
                    let _ = tx.send(PlaybackEvent::Finished);
                    break;
                }
                let progress = PlaybackEvent::Progress {
                    elapsed: sink.get_pos(),
                    total,
                };
                if tx.send(progress).is_err() {
                    // Handle is gone.
                    sink.stop();
                    break;
                }
                thread::sleep(tick);
            }
            log::debug!("playback: thread exiting");
        })
        .map_err(|e| PlaybackError::Spawn(e.to_string()))?;

    Ok(PlaybackHandle {
        events: rx,
        cancel,
        done: false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_needs_a_known_total() {
        assert_eq!(progress_fraction(Duration::from_secs(1), None), None);
        assert_eq!(progress_fraction(Duration::from_secs(1), Some(Duration::ZERO)), None);
    }

    #[test]
    fn fraction_is_clamped() {
        let total = Some(Duration::from_secs(4));
        assert_eq!(progress_fraction(Duration::from_secs(1), total), Some(0.25));
        assert_eq!(progress_fraction(Duration::from_secs(9), total), Some(1.0));
    }

    #[test]
    fn terminal_events() {
        assert!(PlaybackEvent::Finished.is_terminal());
        assert!(PlaybackEvent::Stopped.is_terminal());
        assert!(PlaybackEvent::Failed("x".into()).is_terminal());
        assert!(!PlaybackEvent::Started { total: None }.is_terminal());
    }

    #[test]
    fn missing_file_fails_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let err = play(&dir.path().join("gone.mp3"), DEFAULT_TICK).err().unwrap();
        assert!(matches!(err, PlaybackError::Read(_)));
    }
}
