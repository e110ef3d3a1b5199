//! Application entry point — Visionary.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and apply
//!    environment overrides for API keys.
//! 3. Create the [`tokio`] runtime.
//! 4. Build the vision and speech backends from config.
//! 5. Create the session orchestrator (purges leftover audio artifacts).
//! 6. Create session channels (`command`, `event`) and spawn the
//!    orchestrator on the runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.
//! 8. Best-effort purge of audio artifacts.

use std::sync::Arc;

use tokio::sync::mpsc;
use visionary::{
    app::VisionaryApp,
    artifact::ArtifactStore,
    config::AppConfig,
    session::{Orchestrator, SessionCommand, SessionEvent},
    speech::{DeepgramBackend, SpeechBackend, SpeechSynthesizer},
    vision::{AnalysisEngine, ChatVisionBackend, VisionBackend},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("Visionary")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 320.0])
        .with_drag_and_drop(true);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Visionary starting up");

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();
    if config.vision.api_key.as_deref().map_or(true, str::is_empty) {
        log::warn!("No vision API key configured; hosted vision APIs will reject requests");
    }
    if config.speech.api_key.as_deref().map_or(true, str::is_empty) {
        log::warn!("No speech API key configured; audio generation will fail");
    }

    // 3. Tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // 4. Backends
    let vision: Arc<dyn VisionBackend> = Arc::new(ChatVisionBackend::from_config(&config.vision));
    let speech: Arc<dyn SpeechBackend> = Arc::new(DeepgramBackend::from_config(&config.speech));
    let store = ArtifactStore::from_config(&config);
    log::info!("Audio artifacts in {}", store.dir().display());

    // 5. Session orchestrator
    let orchestrator = Orchestrator::new(
        AnalysisEngine::new(vision),
        SpeechSynthesizer::new(speech, store.clone()),
        config.session.clone(),
    );

    // 6. Channel setup; the orchestrator owns the session from here on
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(32);
    rt.spawn(orchestrator.run(command_rx, event_tx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = VisionaryApp::new(command_tx, event_rx, config.clone());
    let options = native_options(&config);

    let result = eframe::run_native(
        "Visionary",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    // 8. The orchestrator purges on Shutdown; this covers a runtime torn
    //    down before it got there.
    drop(rt);
    let report = store.purge_all();
    if report.removed > 0 {
        log::info!("Removed {} leftover audio file(s)", report.removed);
    }

    result
}
