//! `AnalysisEngine` — turns an image and a mode into descriptive text.
//!
//! The engine owns no network code itself; it builds a [`VisionRequest`]
//! from the mode's fixed templates and hands it to a [`VisionBackend`].
//!
//! [`MockVisionBackend`] (available under `#[cfg(test)]`) records every
//! request and replays scripted replies, so the session lifecycle can be
//! tested without a hosted model.

use std::sync::Arc;

use crate::image::Image;
use crate::vision::backend::{AnalysisError, VisionBackend, VisionRequest};
use crate::vision::mode::AnalysisMode;

/// Dispatches analysis requests to a vision backend.
#[derive(Clone)]
pub struct AnalysisEngine {
    backend: Arc<dyn VisionBackend>,
}

impl AnalysisEngine {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self { backend }
    }

    /// Build the request for `image` under `mode`.
    pub fn request_for(image: &Image, mode: AnalysisMode) -> VisionRequest {
        VisionRequest {
            system: mode.system_instruction().to_string(),
            image_data_uri: image.to_data_uri(),
            prompt: mode.task_prompt().to_string(),
        }
    }

    /// Run one analysis.  The model's text is returned as-is; no retries.
    pub async fn analyze(&self, image: &Image, mode: AnalysisMode) -> Result<String, AnalysisError> {
        log::debug!(
            "analysis: {} on image {} ({}, {} bytes)",
            mode,
            image.id(),
            image.format().label(),
            image.size()
        );
        let request = Self::request_for(image, mode);
        self.backend.complete(&request).await
    }

    pub async fn scene_understanding(&self, image: &Image) -> Result<String, AnalysisError> {
        self.analyze(image, AnalysisMode::SceneUnderstanding).await
    }

    pub async fn text_extraction(&self, image: &Image) -> Result<String, AnalysisError> {
        self.analyze(image, AnalysisMode::TextExtraction).await
    }

    pub async fn object_detection(&self, image: &Image) -> Result<String, AnalysisError> {
        self.analyze(image, AnalysisMode::ObjectDetection).await
    }

    pub async fn task_guidance(&self, image: &Image) -> Result<String, AnalysisError> {
        self.analyze(image, AnalysisMode::TaskGuidance).await
    }
}

// ---------------------------------------------------------------------------
// MockVisionBackend  (test-only)
// ---------------------------------------------------------------------------

/// Records requests and replies from a script.  When the script runs out
/// the last reply is repeated.
#[cfg(test)]
pub struct MockVisionBackend {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, AnalysisError>>>,
    last: std::sync::Mutex<Option<Result<String, AnalysisError>>>,
    requests: std::sync::Mutex<Vec<VisionRequest>>,
}

#[cfg(test)]
impl MockVisionBackend {
    pub fn scripted(replies: Vec<Result<String, AnalysisError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            last: std::sync::Mutex::new(None),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn ok(text: impl Into<String>) -> Self {
        Self::scripted(vec![Ok(text.into())])
    }

    pub fn err(error: AnalysisError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl VisionBackend for MockVisionBackend {
    async fn complete(&self, request: &VisionRequest) -> Result<String, AnalysisError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        last.clone()
            .unwrap_or_else(|| Err(AnalysisError::EmptyResponse))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::png_bytes;

    fn image() -> Image {
        Image::from_bytes("photo.png", png_bytes()).unwrap()
    }

    #[tokio::test]
    async fn passes_model_text_through() {
        let backend = Arc::new(MockVisionBackend::ok("A kitchen with a kettle."));
        let engine = AnalysisEngine::new(backend.clone());

        let text = engine.scene_understanding(&image()).await.unwrap();
        assert_eq!(text, "A kitchen with a kettle.");
    }

    #[tokio::test]
    async fn request_uses_mode_templates_and_data_uri() {
        let backend = Arc::new(MockVisionBackend::ok("ok"));
        let engine = AnalysisEngine::new(backend.clone());
        let img = image();

        engine.object_detection(&img).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].system,
            AnalysisMode::ObjectDetection.system_instruction()
        );
        assert_eq!(requests[0].prompt, AnalysisMode::ObjectDetection.task_prompt());
        assert_eq!(requests[0].image_data_uri, img.to_data_uri());
    }

    #[tokio::test]
    async fn named_operations_select_their_mode() {
        let backend = Arc::new(MockVisionBackend::ok("ok"));
        let engine = AnalysisEngine::new(backend.clone());
        let img = image();

        engine.scene_understanding(&img).await.unwrap();
        engine.text_extraction(&img).await.unwrap();
        engine.object_detection(&img).await.unwrap();
        engine.task_guidance(&img).await.unwrap();

        let systems: Vec<String> = backend.requests().into_iter().map(|r| r.system).collect();
        let expected: Vec<String> = AnalysisMode::ALL
            .iter()
            .map(|m| m.system_instruction().to_string())
            .collect();
        assert_eq!(systems, expected);
    }

    #[tokio::test]
    async fn errors_surface_once() {
        let backend = Arc::new(MockVisionBackend::err(AnalysisError::Quota));
        let engine = AnalysisEngine::new(backend.clone());

        let err = engine.task_guidance(&image()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Quota));
        assert_eq!(backend.requests().len(), 1, "no retries");
    }
}
