use serde::Serialize;

/// A sound effect requested by the quest logic.
/// The page plays the matching `<audio>` element (`goalSound`, `applauseSound`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEvent {
    Goal,
    Applause,
}

/// How feedback text is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackTone {
    Success,
    Funny,
}
