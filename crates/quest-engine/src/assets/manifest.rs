use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::config::QuestConfig;

/// Everything a quest needs besides code: stages, reveal content, the final
/// screen and optional settings. Loaded from a JSON file at startup and
/// immutable for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestManifest {
    /// Number of stages the quest runs for. Defaults to `stages.len()`.
    /// A larger value leaves trailing stages without a definition.
    #[serde(default)]
    pub total_stages: Option<usize>,
    pub stages: Vec<StageDef>,
    /// "Memory moment" shown after a stage, keyed by zero-based stage index.
    #[serde(default)]
    pub stage_content: BTreeMap<usize, StageContent>,
    #[serde(default)]
    pub final_content: Option<FinalContent>,
    #[serde(default)]
    pub settings: QuestConfig,
}

/// A single stage, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StageDef {
    Question(QuestionStage),
    Action(ActionStage),
    /// Any other `type`. Kept so the quest can recover when it reaches it.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStage {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub correct_feedback: String,
    #[serde(default)]
    pub wrong_feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStage {
    /// Raw `actionType`; see [`ActionStage::kind`].
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Feedback shown once the action resolves.
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<SelectItem>>,
    #[serde(default)]
    pub places: Option<Vec<SelectPlace>>,
}

/// Action subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Button,
    Penalty,
    SelectItem,
    SelectPlace,
    /// Missing or unrecognised `actionType`. Presented as a plain button.
    Unknown,
}

impl ActionStage {
    pub fn kind(&self) -> ActionKind {
        match self.action_type.as_deref() {
            Some("button") => ActionKind::Button,
            Some("penalty") => ActionKind::Penalty,
            Some("selectItem") => ActionKind::SelectItem,
            Some("selectPlace") => ActionKind::SelectPlace,
            _ => ActionKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub correct: bool,
}

/// Reveal content for a stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageContent {
    /// `text`, `image` or `video`; anything else renders as text.
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
}

/// Media to show in the reveal modal, resolved from a [`StageContent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentMedia {
    Image { path: String, alt: String },
    Video { path: String },
    Text { text: String },
}

impl StageContent {
    pub fn title_or_default(&self) -> String {
        self.title.clone().unwrap_or_else(|| "A moment to remember".to_string())
    }

    /// Caption under the media: description, then content.
    pub fn caption(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.content.clone())
            .unwrap_or_default()
    }

    /// Image and video need their path; everything else falls back to text.
    pub fn media(&self) -> ContentMedia {
        match (self.content_type.as_deref(), &self.image_path, &self.video_path) {
            (Some("image"), Some(path), _) => ContentMedia::Image {
                path: path.clone(),
                alt: self.title.clone().unwrap_or_else(|| "Image".to_string()),
            },
            (Some("video"), _, Some(path)) => ContentMedia::Video { path: path.clone() },
            _ => ContentMedia::Text {
                text: self
                    .content
                    .clone()
                    .or_else(|| self.description.clone())
                    .unwrap_or_else(|| "A moment to remember".to_string()),
            },
        }
    }
}

/// End-of-quest summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ending: Option<String>,
}

/// Final summary with every fallback applied, ready for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalSummary {
    pub title: String,
    pub text: String,
    pub description: String,
    pub message: String,
    pub ending: String,
}

impl FinalContent {
    pub fn summary(&self) -> FinalSummary {
        FinalSummary {
            title: self.title.clone().unwrap_or_else(|| "🎉 Congratulations! 🎉".to_string()),
            text: self.text.clone().unwrap_or_else(|| "You finished the whole quest!".to_string()),
            description: self.description.clone().unwrap_or_default(),
            message: self.message.clone().unwrap_or_default(),
            ending: self.ending.clone().unwrap_or_else(|| "With love! ❤️".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("manifest has no stages")]
    Empty,
    #[error("stage {stage}: question has no options")]
    NoOptions { stage: usize },
    #[error("stage {stage}: correct answer {answer} is out of range for {options} options")]
    CorrectAnswerOutOfRange {
        stage: usize,
        answer: usize,
        options: usize,
    },
}

impl QuestManifest {
    /// Parse and validate a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject manifests the quest cannot run at all. Unknown stage types and
    /// missing trailing definitions pass: they are recovered from at runtime.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.stages.is_empty() || self.total_stages() == 0 {
            return Err(ManifestError::Empty);
        }
        for (stage, def) in self.stages.iter().enumerate() {
            if let StageDef::Question(q) = def {
                if q.options.is_empty() {
                    return Err(ManifestError::NoOptions { stage });
                }
                if q.correct_answer >= q.options.len() {
                    return Err(ManifestError::CorrectAnswerOutOfRange {
                        stage,
                        answer: q.correct_answer,
                        options: q.options.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn total_stages(&self) -> usize {
        self.total_stages.unwrap_or(self.stages.len())
    }

    pub fn stage(&self, index: usize) -> Option<&StageDef> {
        self.stages.get(index)
    }

    pub fn content(&self, index: usize) -> Option<&StageContent> {
        self.stage_content.get(&index)
    }

    pub fn final_summary(&self) -> FinalSummary {
        match &self.final_content {
            Some(content) => content.summary(),
            None => {
                log::error!("manifest: final content missing, using the default summary");
                FinalContent::default().summary()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "stages": [
            { "type": "question", "question": "Who?", "options": ["A", "B"], "correctAnswer": 1,
              "correctFeedback": "Yes", "wrongFeedback": "No" },
            { "type": "action", "actionType": "penalty", "title": "Shoot" },
            { "type": "action", "actionType": "selectItem",
              "items": [ { "emoji": "⚽", "name": "Ball", "correct": true }, { "name": "Boot" } ] },
            { "type": "action" },
            { "type": "dance" }
        ],
        "stageContent": {
            "0": { "type": "image", "title": "Photo", "imagePath": "a.jpg" },
            "1": { "type": "video", "description": "no path" }
        },
        "settings": { "progressKey": "test_progress" }
    }"#;

    #[test]
    fn parse_stage_kinds() {
        let manifest = QuestManifest::from_json(MINIMAL).unwrap();
        assert_eq!(manifest.total_stages(), 5);
        assert!(matches!(manifest.stage(0), Some(StageDef::Question(q)) if q.correct_answer == 1));
        match manifest.stage(1) {
            Some(StageDef::Action(a)) => assert_eq!(a.kind(), ActionKind::Penalty),
            other => panic!("expected action, got {:?}", other),
        }
        match manifest.stage(2) {
            Some(StageDef::Action(a)) => {
                assert_eq!(a.kind(), ActionKind::SelectItem);
                let items = a.items.as_ref().unwrap();
                assert!(items[0].correct);
                assert!(!items[1].correct);
            }
            other => panic!("expected action, got {:?}", other),
        }
        match manifest.stage(3) {
            Some(StageDef::Action(a)) => assert_eq!(a.kind(), ActionKind::Unknown),
            other => panic!("expected action, got {:?}", other),
        }
        assert!(matches!(manifest.stage(4), Some(StageDef::Unknown)));
        assert_eq!(manifest.settings.progress_key, "test_progress");
    }

    #[test]
    fn content_media_falls_back_to_text() {
        let manifest = QuestManifest::from_json(MINIMAL).unwrap();
        assert_eq!(
            manifest.content(0).unwrap().media(),
            ContentMedia::Image { path: "a.jpg".into(), alt: "Photo".into() }
        );
        assert_eq!(
            manifest.content(1).unwrap().media(),
            ContentMedia::Text { text: "no path".into() }
        );
        assert!(manifest.content(2).is_none());
    }

    #[test]
    fn rejects_bad_correct_answer() {
        let json = r#"{ "stages": [
            { "type": "question", "question": "?", "options": ["A"], "correctAnswer": 3 }
        ] }"#;
        assert!(matches!(
            QuestManifest::from_json(json),
            Err(ManifestError::CorrectAnswerOutOfRange { stage: 0, answer: 3, options: 1 })
        ));
    }

    #[test]
    fn rejects_empty_manifest() {
        assert!(matches!(
            QuestManifest::from_json(r#"{ "stages": [] }"#),
            Err(ManifestError::Empty)
        ));
        assert!(matches!(QuestManifest::from_json("{"), Err(ManifestError::Parse(_))));
    }

    #[test]
    fn final_summary_applies_fallbacks() {
        let manifest = QuestManifest::from_json(MINIMAL).unwrap();
        let summary = manifest.final_summary();
        assert_eq!(summary.text, "You finished the whole quest!");
        assert_eq!(summary.message, "");
    }

    #[test]
    fn demo_manifest_is_valid() {
        let manifest =
            QuestManifest::from_json(include_str!("../../../../demos/football-quest/quest.json"))
                .unwrap();
        assert_eq!(manifest.total_stages(), 25);
        assert!(manifest.final_content.is_some());
    }
}
