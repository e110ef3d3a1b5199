//! The four analysis modes and their fixed instruction templates.
//!
//! Each [`AnalysisMode`] maps to exactly one system instruction and one task
//! prompt.  The mapping is an exhaustive `match`, so adding a mode without
//! its templates does not compile.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const SCENE_SYSTEM: &str = "\
You are an assistant helping blind and low-vision people understand visual scenes.
Describe the image vividly and accurately.
Cover the layout, colours, objects, people and the spatial relationships between them.
Keep the answer short and clear.";

const TEXT_SYSTEM: &str = "\
You are a text extraction assistant for blind and low-vision readers.
Extract ALL readable text from the image.
Preserve the reading order and group the text by section and heading.
Keep the answer short and clear.";

const OBJECTS_SYSTEM: &str = "\
You are a safety-oriented object detection assistant for blind and low-vision navigation.
Identify the objects in the image and describe where each one is.
List obstacles and hazards first, before anything else.
Keep the answer short and clear.";

const TASK_SYSTEM: &str = "\
You are a practical assistance companion for blind and low-vision users.
Work out what the user can do with what is shown and give actionable, step-by-step guidance.
Base every instruction on what is actually visible.
Keep the answer short and clear.";

// ---------------------------------------------------------------------------
// Task prompts
// ---------------------------------------------------------------------------

const SCENE_PROMPT: &str =
    "Describe every significant detail in this scene, explaining layout, colours, and key elements.";

const TEXT_PROMPT: &str =
    "Extract ALL readable text from this image. Organise it by sections, headings, and reading sequence.";

const OBJECTS_PROMPT: &str = "\
Systematically identify the objects in this scene. For each object, give:
1. Object name
2. Location in the image
3. Potential navigation impact
4. Safety considerations";

const TASK_PROMPT: &str = "\
Analyse this image and give detailed, step-by-step guidance.
Identify the objects, their likely use, and offer practical instructions.";

// ---------------------------------------------------------------------------
// AnalysisMode
// ---------------------------------------------------------------------------

/// What kind of analysis to run on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalysisMode {
    /// Descriptive narration of the whole scene.
    #[default]
    SceneUnderstanding,
    /// OCR-style extraction preserving reading order.
    TextExtraction,
    /// Hazard-first object enumeration for navigation.
    ObjectDetection,
    /// Step-by-step instructions for the task at hand.
    TaskGuidance,
}

impl AnalysisMode {
    /// Every mode, in the order they are offered to the user.
    pub const ALL: [AnalysisMode; 4] = [
        AnalysisMode::SceneUnderstanding,
        AnalysisMode::TextExtraction,
        AnalysisMode::ObjectDetection,
        AnalysisMode::TaskGuidance,
    ];

    /// Short label for buttons and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::SceneUnderstanding => "Scene Understanding",
            AnalysisMode::TextExtraction => "Text Extraction",
            AnalysisMode::ObjectDetection => "Object Detection",
            AnalysisMode::TaskGuidance => "Task Guidance",
        }
    }

    /// One-line explanation shown next to the mode selector.
    pub fn summary(&self) -> &'static str {
        match self {
            AnalysisMode::SceneUnderstanding => "Detailed visual scene description",
            AnalysisMode::TextExtraction => "Read out the text in the image",
            AnalysisMode::ObjectDetection => "Obstacles, hazards and where things are",
            AnalysisMode::TaskGuidance => "Context-specific, step-by-step instructions",
        }
    }

    /// The fixed system instruction sent with every request in this mode.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            AnalysisMode::SceneUnderstanding => SCENE_SYSTEM,
            AnalysisMode::TextExtraction => TEXT_SYSTEM,
            AnalysisMode::ObjectDetection => OBJECTS_SYSTEM,
            AnalysisMode::TaskGuidance => TASK_SYSTEM,
        }
    }

    /// The task-specific instruction placed next to the image.
    pub fn task_prompt(&self) -> &'static str {
        match self {
            AnalysisMode::SceneUnderstanding => SCENE_PROMPT,
            AnalysisMode::TextExtraction => TEXT_PROMPT,
            AnalysisMode::ObjectDetection => OBJECTS_PROMPT,
            AnalysisMode::TaskGuidance => TASK_PROMPT,
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_mode_has_a_distinct_system_instruction() {
        let set: HashSet<_> = AnalysisMode::ALL
            .iter()
            .map(|m| m.system_instruction())
            .collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn every_mode_has_a_distinct_task_prompt() {
        let set: HashSet<_> = AnalysisMode::ALL.iter().map(|m| m.task_prompt()).collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn object_detection_asks_for_safety_fields() {
        let prompt = AnalysisMode::ObjectDetection.task_prompt();
        assert!(prompt.contains("Object name"));
        assert!(prompt.contains("Location"));
        assert!(prompt.contains("navigation impact"));
        assert!(prompt.contains("Safety"));
        assert!(AnalysisMode::ObjectDetection
            .system_instruction()
            .contains("hazards"));
    }

    #[test]
    fn text_extraction_preserves_reading_order() {
        assert!(AnalysisMode::TextExtraction
            .system_instruction()
            .contains("reading order"));
    }

    #[test]
    fn task_guidance_is_step_by_step() {
        assert!(AnalysisMode::TaskGuidance
            .system_instruction()
            .contains("step-by-step"));
    }

    #[test]
    fn every_instruction_asks_for_brevity() {
        for mode in AnalysisMode::ALL {
            assert!(
                mode.system_instruction().contains("short and clear"),
                "{mode} must ask for a short answer"
            );
        }
    }

    #[test]
    fn default_mode_is_scene_understanding() {
        assert_eq!(AnalysisMode::default(), AnalysisMode::SceneUnderstanding);
        assert_eq!(AnalysisMode::default().to_string(), "Scene Understanding");
    }
}
