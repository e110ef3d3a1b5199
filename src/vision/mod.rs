//! Image analysis against a hosted vision-language model.
//!
//! This module provides:
//! * [`AnalysisMode`] — the four analysis intents and their instruction templates.
//! * [`AnalysisEngine`] — builds one request per analysis and returns the model's text.
//! * [`VisionBackend`] — async trait implemented by every model client.
//! * [`ChatVisionBackend`] — OpenAI-compatible `/chat/completions` client.
//! * [`AnalysisError`] — error variants for vision calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use visionary::config::AppConfig;
//! use visionary::image::Image;
//! use visionary::vision::{AnalysisEngine, AnalysisMode, ChatVisionBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let engine = AnalysisEngine::new(Arc::new(ChatVisionBackend::from_config(&config.vision)));
//!
//!     let image = Image::from_path("street.jpg".as_ref()).unwrap();
//!     let text = engine.analyze(&image, AnalysisMode::ObjectDetection).await.unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod backend;
pub mod engine;
pub mod mode;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backend::{AnalysisError, ChatVisionBackend, VisionBackend, VisionRequest};
pub use engine::AnalysisEngine;
pub use mode::AnalysisMode;

#[cfg(test)]
pub use engine::MockVisionBackend;
