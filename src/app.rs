//! Visionary window — egui/eframe application.
//!
//! # Architecture
//!
//! [`VisionaryApp`] is the top-level [`eframe::App`].  It owns two channel
//! endpoints:
//!
//! * `command_tx` — sends [`SessionCommand`]s to the session orchestrator.
//! * `event_rx`   — receives [`SessionEvent`]s back.
//!
//! The window only collects user intent (mode, image, analyze, listen) and
//! renders replies; every state change happens in the orchestrator.
//!
//! | Control | Command |
//! |---------|---------|
//! | Mode selector | none (sent with the next analysis) |
//! | Load / drop file | `Upload` |
//! | Analyze | `Analyze(mode)` |
//! | Listen | `Synthesize` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::image::{Image, ImageFormat};
use crate::playback::{self, PlaybackEvent, PlaybackHandle};
use crate::session::{SessionCommand, SessionEvent, SessionPhase};
use crate::vision::AnalysisMode;

// ---------------------------------------------------------------------------
// UI-side view state
// ---------------------------------------------------------------------------

/// What the orchestrator is currently working on, as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Busy {
    Analyzing(AnalysisMode),
    Synthesizing,
}

/// Summary of the loaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub name: String,
    pub format: ImageFormat,
    pub size: usize,
}

/// Playback position for the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackProgress {
    pub elapsed: Duration,
    pub total: Option<Duration>,
}

// ---------------------------------------------------------------------------
// VisionaryApp
// ---------------------------------------------------------------------------

pub struct VisionaryApp {
    /// Mode used for the next analysis.
    pub mode: AnalysisMode,
    /// Path typed into the file field.
    pub path_input: String,
    /// Session phase as reported by the orchestrator's events.
    pub phase: SessionPhase,
    pub image: Option<LoadedImage>,
    /// Latest analysis text and the mode that produced it.
    pub result: Option<(AnalysisMode, String)>,
    pub audio_path: Option<PathBuf>,
    pub busy: Option<Busy>,
    pub error_message: Option<String>,

    playback: Option<PlaybackHandle>,
    pub progress: Option<PlaybackProgress>,

    command_tx: mpsc::Sender<SessionCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,

    pub config: AppConfig,
}

impl VisionaryApp {
    pub fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        config: AppConfig,
    ) -> Self {
        Self {
            mode: AnalysisMode::default(),
            path_input: String::new(),
            phase: SessionPhase::Empty,
            image: None,
            result: None,
            audio_path: None,
            busy: None,
            error_message: None,
            playback: None,
            progress: None,
            command_tx,
            event_rx,
            config,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn send(&mut self, command: SessionCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            self.error_message = Some(format!("session is not responding: {e}"));
        }
    }

    /// Read an image file and hand it to the session.
    ///
    /// Unreadable or unsupported files are reported here and never sent.
    pub fn upload_path(&mut self, path: &Path) {
        match Image::from_path(path) {
            Ok(image) => {
                let name = image.name().to_string();
                self.upload_bytes(name, image.into_bytes());
            }
            Err(e) => {
                self.error_message = Some(format!("{}: {e}", path.display()));
            }
        }
    }

    pub fn upload_bytes(&mut self, name: String, bytes: Vec<u8>) {
        self.stop_playback();
        self.error_message = None;
        self.send(SessionCommand::Upload { name, bytes });
    }

    pub fn request_analysis(&mut self) {
        if !self.phase.can_analyze() || self.busy.is_some() {
            return;
        }
        self.error_message = None;
        self.busy = Some(Busy::Analyzing(self.mode));
        self.send(SessionCommand::Analyze(self.mode));
    }

    pub fn request_audio(&mut self) {
        if !self.phase.can_synthesize() || self.busy.is_some() {
            return;
        }
        self.stop_playback();
        self.error_message = None;
        self.busy = Some(Busy::Synthesizing);
        self.send(SessionCommand::Synthesize);
    }

    // ── Session events ───────────────────────────────────────────────────

    /// Drain all pending session events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_event(event);
        }
    }

    /// Fold one orchestrator event into the view state.
    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ImageLoaded {
                name, format, size, ..
            } => {
                self.image = Some(LoadedImage { name, format, size });
                self.result = None;
                self.clear_audio();
                self.phase = SessionPhase::ImageLoaded;
            }
            SessionEvent::AnalysisStarted { mode } => {
                self.busy = Some(Busy::Analyzing(mode));
            }
            SessionEvent::AnalysisComplete { mode, text } => {
                self.busy = None;
                self.result = Some((mode, text));
                // Audio kept across re-analysis is cleared by a later event.
                self.phase = if self.audio_path.is_some() {
                    SessionPhase::AudioReady
                } else {
                    SessionPhase::ResultReady
                };
            }
            SessionEvent::SynthesisStarted => {
                self.busy = Some(Busy::Synthesizing);
            }
            SessionEvent::AudioReady { path } => {
                self.busy = None;
                self.audio_path = Some(path);
                self.phase = SessionPhase::AudioReady;
                if self.config.ui.auto_play {
                    self.start_playback();
                }
            }
            SessionEvent::AudioCleared => {
                self.clear_audio();
                if self.phase == SessionPhase::AudioReady {
                    self.phase = SessionPhase::ResultReady;
                }
            }
            SessionEvent::Error { message } => {
                self.busy = None;
                self.error_message = Some(message);
            }
        }
    }

    // ── Playback ─────────────────────────────────────────────────────────

    fn start_playback(&mut self) {
        self.stop_playback();
        let Some(path) = self.audio_path.clone() else {
            return;
        };
        match playback::play(&path, playback::DEFAULT_TICK) {
            Ok(handle) => {
                self.playback = Some(handle);
                self.progress = Some(PlaybackProgress::default());
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn stop_playback(&mut self) {
        if let Some(handle) = self.playback.take() {
            handle.stop();
        }
        self.progress = None;
    }

    fn clear_audio(&mut self) {
        self.stop_playback();
        self.audio_path = None;
    }

    fn poll_playback(&mut self) {
        let Some(handle) = self.playback.as_mut() else {
            return;
        };
        let mut finished = false;
        while let Some(event) = handle.poll() {
            match event {
                PlaybackEvent::Started { total } => {
                    self.progress = Some(PlaybackProgress {
                        elapsed: Duration::ZERO,
                        total,
                    });
                }
                PlaybackEvent::Progress { elapsed, total } => {
                    self.progress = Some(PlaybackProgress { elapsed, total });
                }
                PlaybackEvent::Finished | PlaybackEvent::Stopped => finished = true,
                PlaybackEvent::Failed(message) => {
                    self.error_message = Some(format!("playback failed: {message}"));
                    finished = true;
                }
            }
        }
        if finished {
            self.playback = None;
            self.progress = None;
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_modes(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Choose analysis type").strong());
        ui.horizontal_wrapped(|ui| {
            for mode in AnalysisMode::ALL {
                ui.radio_value(&mut self.mode, mode, mode.label())
                    .on_hover_text(mode.summary());
            }
        });
    }

    fn draw_upload(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Image:");
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.path_input)
                    .hint_text("path to a JPG, PNG or WEBP file (or drop one here)")
                    .desired_width(ui.available_width() - 70.0),
            );
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Load").clicked() || submitted {
                let path = PathBuf::from(self.path_input.trim());
                if !path.as_os_str().is_empty() {
                    self.upload_path(&path);
                }
            }
        });

        if let Some(image) = &self.image {
            ui.label(
                egui::RichText::new(format!(
                    "{} — {}, {:.1} KB",
                    image.name,
                    image.format.label(),
                    image.size as f32 / 1024.0
                ))
                .color(egui::Color32::from_rgb(140, 140, 140)),
            );
        }
    }

    fn draw_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let can_analyze = self.phase.can_analyze() && self.busy.is_none();
            if ui
                .add_enabled(
                    can_analyze,
                    egui::Button::new(format!("Analyze for {}", self.mode.label())),
                )
                .clicked()
            {
                self.request_analysis();
            }

            let can_listen = self.phase.can_synthesize() && self.busy.is_none();
            if ui
                .add_enabled(can_listen, egui::Button::new("Listen to description"))
                .clicked()
            {
                self.request_audio();
            }

            match self.busy {
                Some(Busy::Analyzing(mode)) => {
                    ui.spinner();
                    ui.label(format!("Performing {} analysis...", mode.label()));
                }
                Some(Busy::Synthesizing) => {
                    ui.spinner();
                    ui.label("Generating audio...");
                }
                None => {
                    ui.weak(self.phase.label());
                }
            }
        });
    }

    fn draw_result(&mut self, ui: &mut egui::Ui) {
        let Some((mode, text)) = &self.result else {
            return;
        };
        ui.label(
            egui::RichText::new(format!("Analysis results — {}", mode.label()))
                .color(egui::Color32::from_rgb(0, 210, 255))
                .strong(),
        );
        egui::ScrollArea::vertical()
            .max_height(260.0)
            .show(ui, |ui| {
                ui.label(text.as_str());
            });
    }

    fn draw_audio(&mut self, ui: &mut egui::Ui) {
        if self.audio_path.is_none() {
            return;
        }
        ui.horizontal(|ui| {
            if self.playback.is_some() {
                if ui.button("Stop").clicked() {
                    self.stop_playback();
                }
            } else if ui.button("Play").clicked() {
                self.start_playback();
            }

            if let Some(progress) = self.progress {
                let bar = match playback::progress_fraction(progress.elapsed, progress.total) {
                    Some(fraction) => egui::ProgressBar::new(fraction),
                    None => egui::ProgressBar::new(0.0).animate(true),
                };
                ui.add(bar.text(format!("{:.1}s", progress.elapsed.as_secs_f32())));
            }
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(bytes) = file.bytes {
            self.upload_bytes(file.name.clone(), bytes.to_vec());
        } else if let Some(path) = file.path {
            self.path_input = path.display().to_string();
            self.upload_path(&path);
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VisionaryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.poll_playback();
        self.handle_dropped_files(ctx);

        // Keep polling while work is in flight or audio is playing.
        if self.busy.is_some() || self.playback.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Visionary: image analysis for blind and low-vision users");
            ui.separator();
            self.draw_modes(ui);
            ui.add_space(6.0);
            self.draw_upload(ui);
            ui.add_space(6.0);
            self.draw_actions(ui);

            if let Some(message) = &self.error_message {
                ui.colored_label(egui::Color32::from_rgb(255, 136, 68), message.as_str());
            }

            ui.separator();
            self.draw_result(ui);
            ui.add_space(6.0);
            self.draw_audio(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop_playback();
        let _ = self.command_tx.try_send(SessionCommand::Shutdown);
        log::info!("Visionary window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::png_bytes;

    fn app() -> (
        VisionaryApp,
        mpsc::Receiver<SessionCommand>,
        mpsc::Sender<SessionEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (evt_tx, evt_rx) = mpsc::channel(8);
        let mut config = AppConfig::default();
        config.ui.auto_play = false;
        (VisionaryApp::new(cmd_tx, evt_rx, config), cmd_rx, evt_tx)
    }

    fn loaded() -> SessionEvent {
        let image = crate::image::Image::from_bytes("a.png", png_bytes()).unwrap();
        SessionEvent::ImageLoaded {
            id: image.id(),
            name: "a.png".into(),
            format: ImageFormat::Png,
            size: image.size(),
        }
    }

    #[test]
    fn analyze_is_ignored_without_image() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        app.request_analysis();
        assert!(cmd_rx.try_recv().is_err());
        assert!(app.busy.is_none());
    }

    #[test]
    fn analyze_sends_selected_mode() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        app.apply_event(loaded());
        app.mode = AnalysisMode::TaskGuidance;

        app.request_analysis();
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(SessionCommand::Analyze(AnalysisMode::TaskGuidance))
        ));
        assert_eq!(app.busy, Some(Busy::Analyzing(AnalysisMode::TaskGuidance)));

        // A second click while busy is swallowed.
        app.request_analysis();
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn image_loaded_clears_result_and_audio() {
        let (mut app, _cmd_rx, _evt_tx) = app();
        app.apply_event(loaded());
        app.apply_event(SessionEvent::AnalysisComplete {
            mode: AnalysisMode::SceneUnderstanding,
            text: "A porch".into(),
        });
        app.apply_event(SessionEvent::AudioReady {
            path: PathBuf::from("/tmp/description_1.mp3"),
        });
        assert!(app.audio_path.is_some());

        app.apply_event(loaded());
        assert!(app.result.is_none());
        assert!(app.audio_path.is_none());
    }

    #[test]
    fn error_clears_busy() {
        let (mut app, _cmd_rx, _evt_tx) = app();
        app.apply_event(SessionEvent::SynthesisStarted);
        app.apply_event(SessionEvent::Error {
            message: "speech request timed out".into(),
        });
        assert!(app.busy.is_none());
        assert_eq!(app.error_message.as_deref(), Some("speech request timed out"));
    }

    #[test]
    fn listen_needs_a_result() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        app.apply_event(loaded());
        app.request_audio();
        assert!(cmd_rx.try_recv().is_err());

        app.apply_event(SessionEvent::AnalysisComplete {
            mode: AnalysisMode::TextExtraction,
            text: "EXIT".into(),
        });
        app.request_audio();
        assert!(matches!(cmd_rx.try_recv(), Ok(SessionCommand::Synthesize)));
    }

    #[test]
    fn unreadable_path_reports_error_without_command() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        let dir = tempfile::tempdir().unwrap();
        app.upload_path(&dir.path().join("missing.png"));
        assert!(app.error_message.is_some());
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn path_upload_sends_file_name_and_bytes() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("porch.png");
        std::fs::write(&path, png_bytes()).unwrap();

        app.upload_path(&path);
        match cmd_rx.try_recv() {
            Ok(SessionCommand::Upload { name, bytes }) => {
                assert_eq!(name, "porch.png");
                assert_eq!(bytes, png_bytes());
            }
            other => panic!("expected Upload, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_file_is_not_sent() {
        let (mut app, mut cmd_rx, _evt_tx) = app();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        app.upload_path(&path);
        assert!(app.error_message.is_some());
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn phase_follows_session_events() {
        let (mut app, _cmd_rx, _evt_tx) = app();
        assert_eq!(app.phase, SessionPhase::Empty);

        app.apply_event(loaded());
        assert_eq!(app.phase, SessionPhase::ImageLoaded);

        app.apply_event(SessionEvent::AnalysisComplete {
            mode: AnalysisMode::ObjectDetection,
            text: "Chair ahead".into(),
        });
        assert_eq!(app.phase, SessionPhase::ResultReady);

        app.apply_event(SessionEvent::AudioReady {
            path: PathBuf::from("/tmp/description_2.mp3"),
        });
        assert_eq!(app.phase, SessionPhase::AudioReady);

        // Failed re-synthesis: old audio cleared, then the error.
        app.apply_event(SessionEvent::SynthesisStarted);
        app.apply_event(SessionEvent::AudioCleared);
        app.apply_event(SessionEvent::Error {
            message: "speech request timed out".into(),
        });
        assert_eq!(app.phase, SessionPhase::ResultReady);
        assert!(app.audio_path.is_none());

        app.apply_event(loaded());
        assert_eq!(app.phase, SessionPhase::ImageLoaded);
    }
}
