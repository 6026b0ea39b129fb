use serde::Serialize;
use thiserror::Error;

use crate::api::types::{FeedbackTone, SoundEvent};
use crate::assets::manifest::{ActionKind, ActionStage, QuestManifest, StageDef};

/// Goal mouth inside the penalty area, in pixels: centred horizontally and
/// resting on the bottom edge.
pub const GOAL_WIDTH: f32 = 200.0;
pub const GOAL_HEIGHT: f32 = 80.0;

/// Feedback delays before a selection or a missed shot resolves.
const CORRECT_PICK_DELAY_MS: u32 = 300;
const WRONG_PICK_DELAY_MS: u32 = 500;
const MISSED_SHOT_DELAY_MS: u32 = 500;

const DEFAULT_FEEDBACK: &str = "Great! Let's keep going!";
const WRONG_PICK_FEEDBACK: &str = "Not quite, but that's fine! Let's keep going! 😊";
const MISSED_SHOT_FEEDBACK: &str = "Almost scored! No matter, let's keep going! ⚽";

/// What kind of stage is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Question,
    Action(ActionKind),
}

/// Sequencer phases.
///
/// ```text
/// Idle(n) -> Presenting(n) -> AwaitingAdvance -> Idle(n+1) ... -> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Presenting(StageKind),
    AwaitingAdvance,
    /// Terminal until `restart`.
    Completed,
}

/// Why a stage could not be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("stage {0} not found")]
    Missing(usize),
    #[error("stage {0} has an unknown type")]
    UnknownType(usize),
}

/// Why a marker tap did not advance the quest. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdvanceRejected {
    #[error("stage {target} is not next after {current}")]
    NotNext { current: usize, target: usize },
    #[error("stage {target} is past the last of {total} stages")]
    PastEnd { target: usize, total: usize },
    #[error("current stage is not finished yet")]
    NotReady,
}

/// A choice item shown on a `selectItem` stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemChoice {
    pub emoji: String,
    pub name: String,
}

/// Stage body as the page renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StageBody {
    Question { question: String, options: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Button { description: String, button_text: String },
    Penalty { description: String },
    SelectItem { description: String, items: Vec<ItemChoice> },
    SelectPlace { description: String, places: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePresentation {
    pub stage: usize,
    pub title: String,
    pub body: StageBody,
}

/// Result of asking the sequencer for the current stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Stage(StagePresentation),
    /// Every stage is done; show the final screen.
    Finished,
    Recovery(StageError),
}

/// Player input on a presented stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice {
    /// Question option, item or place by index.
    Option(usize),
    /// The single action button.
    Press,
    /// Penalty shot at `(x, y)` inside a goal area of the given size.
    Shot { x: f32, y: f32, area_width: f32, area_height: f32 },
}

/// Outcome of a choice, revealed after `delay_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub stage: usize,
    pub correct: bool,
    /// Option the player picked, for highlighting.
    pub selected: Option<usize>,
    /// Correct option of a question, for highlighting.
    pub correct_option: Option<usize>,
    pub feedback: String,
    pub tone: FeedbackTone,
    pub sounds: Vec<SoundEvent>,
    pub delay_ms: u32,
}

/// Whether a shot at `(x, y)` lands in the goal mouth.
pub fn penalty_hit(x: f32, y: f32, area_width: f32, area_height: f32) -> bool {
    let left = area_width / 2.0 - GOAL_WIDTH / 2.0;
    let top = area_height - GOAL_HEIGHT;
    x >= left && x <= left + GOAL_WIDTH && y >= top && y <= top + GOAL_HEIGHT
}

/// Linear stage state machine: which stage is current, and where in its
/// present/answer/advance cycle the player is.
#[derive(Debug, Clone)]
pub struct StageSequencer {
    current: usize,
    total: usize,
    phase: Phase,
}

impl StageSequencer {
    pub fn new(total_stages: usize) -> Self {
        Self {
            current: 0,
            total: total_stages,
            phase: Phase::Idle,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_last_stage(&self) -> bool {
        self.current + 1 == self.total
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Resume at a stored stage (clamped to the last stage).
    pub fn restore(&mut self, stage: usize) {
        self.current = stage.min(self.total.saturating_sub(1));
        self.phase = Phase::Idle;
    }

    /// Back to `Idle(0)`; the only way out of `Completed`.
    pub fn restart(&mut self) {
        self.current = 0;
        self.phase = Phase::Idle;
    }

    /// Recovery after a broken stage: go back one stage (not below 0).
    pub fn step_back(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.phase = Phase::Idle;
        self.current
    }

    /// Describe the current stage and enter `Presenting`.
    pub fn present(&mut self, manifest: &QuestManifest) -> Presentation {
        if self.phase == Phase::Completed || self.current >= self.total {
            return Presentation::Finished;
        }

        let stage = self.current;
        let (kind, title, body) = match manifest.stage(stage) {
            None => return Presentation::Recovery(StageError::Missing(stage)),
            Some(StageDef::Unknown) => return Presentation::Recovery(StageError::UnknownType(stage)),
            Some(StageDef::Question(q)) => (
                StageKind::Question,
                "Question:".to_string(),
                StageBody::Question {
                    question: q.question.clone(),
                    options: q.options.clone(),
                },
            ),
            Some(StageDef::Action(a)) => {
                let (kind, body) = action_body(stage, a);
                let title = a.title.clone().unwrap_or_else(|| "Task".to_string());
                (StageKind::Action(kind), title, body)
            }
        };

        self.phase = Phase::Presenting(kind);
        Presentation::Stage(StagePresentation { stage, title, body })
    }

    /// Apply a choice to the presented stage. Choices that do not fit the
    /// stage, or arrive after it resolved, are ignored.
    pub fn resolve(&mut self, manifest: &QuestManifest, choice: Choice) -> Option<Resolution> {
        let Phase::Presenting(kind) = self.phase else {
            return None;
        };
        let stage = self.current;
        let resolution = match (kind, manifest.stage(stage)?) {
            (StageKind::Question, StageDef::Question(q)) => {
                let Choice::Option(selected) = choice else { return None };
                if selected >= q.options.len() {
                    return None;
                }
                let correct = selected == q.correct_answer;
                Resolution {
                    stage,
                    correct,
                    selected: Some(selected),
                    correct_option: Some(q.correct_answer),
                    feedback: if correct { q.correct_feedback.clone() } else { q.wrong_feedback.clone() },
                    tone: if correct { FeedbackTone::Success } else { FeedbackTone::Funny },
                    sounds: if correct { vec![SoundEvent::Goal] } else { Vec::new() },
                    delay_ms: 0,
                }
            }
            (StageKind::Action(action_kind), StageDef::Action(a)) => {
                resolve_action(stage, action_kind, a, choice)?
            }
            _ => return None,
        };

        self.phase = Phase::AwaitingAdvance;
        Some(resolution)
    }

    /// Move to `target`, which must be the stage right after the current one.
    pub fn advance_to(&mut self, target: usize) -> Result<usize, AdvanceRejected> {
        if target >= self.total {
            return Err(AdvanceRejected::PastEnd { target, total: self.total });
        }
        if target != self.current + 1 {
            return Err(AdvanceRejected::NotNext { current: self.current, target });
        }
        if self.phase != Phase::AwaitingAdvance {
            return Err(AdvanceRejected::NotReady);
        }
        self.current = target;
        self.phase = Phase::Idle;
        Ok(target)
    }

    /// Finish the quest after its last stage resolved.
    pub fn finish(&mut self) -> bool {
        if self.phase != Phase::AwaitingAdvance || !self.is_last_stage() {
            return false;
        }
        self.current = self.total;
        self.phase = Phase::Completed;
        true
    }
}

/// Effective action kind and body. Unknown kinds and selections without a
/// list degrade to a plain button.
fn action_body(stage: usize, a: &ActionStage) -> (ActionKind, StageBody) {
    let description = a.description.clone().unwrap_or_default();
    let button = |description: String| {
        (
            ActionKind::Button,
            StageBody::Button {
                description,
                button_text: a.button_text.clone().unwrap_or_else(|| "Continue".to_string()),
            },
        )
    };

    match a.kind() {
        ActionKind::Penalty => (ActionKind::Penalty, StageBody::Penalty { description }),
        ActionKind::SelectItem => match &a.items {
            Some(items) => (
                ActionKind::SelectItem,
                StageBody::SelectItem {
                    description,
                    items: items
                        .iter()
                        .map(|i| ItemChoice {
                            emoji: i.emoji.clone().unwrap_or_else(|| "❓".to_string()),
                            name: i.name.clone().unwrap_or_else(|| "Item".to_string()),
                        })
                        .collect(),
                },
            ),
            None => {
                log::error!("stage {}: selectItem without items", stage);
                button(description)
            }
        },
        ActionKind::SelectPlace => match &a.places {
            Some(places) => (
                ActionKind::SelectPlace,
                StageBody::SelectPlace {
                    description,
                    places: places
                        .iter()
                        .map(|p| p.name.clone().unwrap_or_else(|| "Place".to_string()))
                        .collect(),
                },
            ),
            None => {
                log::error!("stage {}: selectPlace without places", stage);
                button(description)
            }
        },
        ActionKind::Unknown => {
            log::warn!("stage {}: unknown action type {:?}, showing a button", stage, a.action_type);
            button(description)
        }
        ActionKind::Button => button(description),
    }
}

fn resolve_action(stage: usize, kind: ActionKind, a: &ActionStage, choice: Choice) -> Option<Resolution> {
    let done = |correct: bool, feedback: String, sounds: Vec<SoundEvent>, delay_ms: u32, selected: Option<usize>| Resolution {
        stage,
        correct,
        selected,
        correct_option: None,
        tone: if correct { FeedbackTone::Success } else { FeedbackTone::Funny },
        feedback,
        sounds,
        delay_ms,
    };
    let own_feedback = || a.feedback.clone().unwrap_or_else(|| DEFAULT_FEEDBACK.to_string());
    let wrong_feedback = || a.feedback.clone().unwrap_or_else(|| WRONG_PICK_FEEDBACK.to_string());

    match (kind, choice) {
        (ActionKind::Button, Choice::Press) | (ActionKind::Unknown, Choice::Press) => {
            let mut r = done(true, own_feedback(), Vec::new(), 0, None);
            if a.feedback.is_none() {
                r.tone = FeedbackTone::Funny;
            }
            Some(r)
        }
        (ActionKind::Penalty, Choice::Shot { x, y, area_width, area_height }) => {
            if penalty_hit(x, y, area_width, area_height) {
                Some(done(true, own_feedback(), vec![SoundEvent::Goal, SoundEvent::Applause], 0, None))
            } else {
                Some(done(false, MISSED_SHOT_FEEDBACK.to_string(), Vec::new(), MISSED_SHOT_DELAY_MS, None))
            }
        }
        (ActionKind::SelectItem, Choice::Option(i)) => {
            let item = a.items.as_ref()?.get(i)?;
            Some(pick(item.correct, i, &done, own_feedback, wrong_feedback))
        }
        (ActionKind::SelectPlace, Choice::Option(i)) => {
            let place = a.places.as_ref()?.get(i)?;
            Some(pick(place.correct, i, &done, own_feedback, wrong_feedback))
        }
        _ => None,
    }
}

fn pick(
    correct: bool,
    index: usize,
    done: &impl Fn(bool, String, Vec<SoundEvent>, u32, Option<usize>) -> Resolution,
    own_feedback: impl Fn() -> String,
    wrong_feedback: impl Fn() -> String,
) -> Resolution {
    if correct {
        done(true, own_feedback(), vec![SoundEvent::Goal], CORRECT_PICK_DELAY_MS, Some(index))
    } else {
        done(false, wrong_feedback(), Vec::new(), WRONG_PICK_DELAY_MS, Some(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "totalStages": 8,
        "stages": [
            { "type": "question", "question": "Who scored?", "options": ["A", "B", "C"], "correctAnswer": 2,
              "correctFeedback": "Goal!", "wrongFeedback": "Offside!" },
            { "type": "action", "actionType": "button", "buttonText": "Kick", "feedback": "Nice" },
            { "type": "action", "actionType": "penalty", "description": "Shoot" },
            { "type": "action", "actionType": "selectItem",
              "items": [ { "name": "Ball", "correct": true }, { "name": "Bat" } ] },
            { "type": "action", "actionType": "selectPlace",
              "places": [ { "name": "Stadium" }, { "name": "Park", "correct": true } ] },
            { "type": "action", "actionType": "selectPlace" },
            { "type": "juggle" }
        ]
    }"#;

    fn manifest() -> QuestManifest {
        QuestManifest::from_json(MANIFEST).unwrap()
    }

    fn at(stage: usize) -> StageSequencer {
        let mut seq = StageSequencer::new(8);
        seq.restore(stage);
        seq
    }

    #[test]
    fn advance_only_to_next_stage() {
        let m = manifest();
        for target in 0..10 {
            let mut seq = at(3);
            seq.present(&m);
            seq.resolve(&m, Choice::Option(0));
            let result = seq.advance_to(target);
            if target == 4 {
                assert_eq!(result, Ok(4));
                assert_eq!(seq.current(), 4);
                assert_eq!(seq.phase(), Phase::Idle);
            } else {
                assert!(result.is_err(), "target {} should be rejected", target);
                assert_eq!(seq.current(), 3);
            }
        }
    }

    #[test]
    fn advance_before_answer_is_rejected() {
        let m = manifest();
        let mut seq = at(1);
        seq.present(&m);
        assert_eq!(seq.advance_to(2), Err(AdvanceRejected::NotReady));
        assert_eq!(seq.current(), 1);
    }

    #[test]
    fn question_resolution() {
        let m = manifest();
        let mut seq = at(0);
        let Presentation::Stage(p) = seq.present(&m) else { panic!("expected stage") };
        assert_eq!(p.title, "Question:");
        assert!(matches!(p.body, StageBody::Question { ref options, .. } if options.len() == 3));

        // Out-of-range option is ignored
        assert!(seq.resolve(&m, Choice::Option(7)).is_none());

        let r = seq.resolve(&m, Choice::Option(1)).unwrap();
        assert!(!r.correct);
        assert_eq!(r.feedback, "Offside!");
        assert_eq!(r.correct_option, Some(2));
        assert!(r.sounds.is_empty());
        assert_eq!(seq.phase(), Phase::AwaitingAdvance);

        // Second answer is ignored
        assert!(seq.resolve(&m, Choice::Option(2)).is_none());
    }

    #[test]
    fn correct_answer_plays_goal() {
        let m = manifest();
        let mut seq = at(0);
        seq.present(&m);
        let r = seq.resolve(&m, Choice::Option(2)).unwrap();
        assert!(r.correct);
        assert_eq!(r.tone, FeedbackTone::Success);
        assert_eq!(r.sounds, vec![SoundEvent::Goal]);
    }

    #[test]
    fn button_uses_stage_feedback() {
        let m = manifest();
        let mut seq = at(1);
        let Presentation::Stage(p) = seq.present(&m) else { panic!("expected stage") };
        assert!(matches!(p.body, StageBody::Button { ref button_text, .. } if button_text == "Kick"));
        assert!(seq.resolve(&m, Choice::Option(0)).is_none());
        let r = seq.resolve(&m, Choice::Press).unwrap();
        assert_eq!(r.feedback, "Nice");
    }

    #[test]
    fn penalty_hit_and_miss() {
        assert!(penalty_hit(300.0, 250.0, 600.0, 300.0));
        assert!(!penalty_hit(10.0, 250.0, 600.0, 300.0));
        assert!(!penalty_hit(300.0, 50.0, 600.0, 300.0));

        let m = manifest();
        let mut seq = at(2);
        seq.present(&m);
        let r = seq
            .resolve(&m, Choice::Shot { x: 300.0, y: 260.0, area_width: 600.0, area_height: 300.0 })
            .unwrap();
        assert!(r.correct);
        assert_eq!(r.sounds, vec![SoundEvent::Goal, SoundEvent::Applause]);

        let mut seq = at(2);
        seq.present(&m);
        let r = seq
            .resolve(&m, Choice::Shot { x: 5.0, y: 5.0, area_width: 600.0, area_height: 300.0 })
            .unwrap();
        assert!(!r.correct);
        assert_eq!(r.delay_ms, MISSED_SHOT_DELAY_MS);
        // Repeated shots are ignored
        assert!(seq
            .resolve(&m, Choice::Shot { x: 300.0, y: 260.0, area_width: 600.0, area_height: 300.0 })
            .is_none());
    }

    #[test]
    fn selections_resolve_with_delays() {
        let m = manifest();
        let mut seq = at(3);
        seq.present(&m);
        let r = seq.resolve(&m, Choice::Option(0)).unwrap();
        assert!(r.correct);
        assert_eq!(r.delay_ms, CORRECT_PICK_DELAY_MS);

        let mut seq = at(4);
        seq.present(&m);
        let r = seq.resolve(&m, Choice::Option(0)).unwrap();
        assert!(!r.correct);
        assert_eq!(r.feedback, WRONG_PICK_FEEDBACK);
        assert_eq!(r.delay_ms, WRONG_PICK_DELAY_MS);
    }

    #[test]
    fn selection_without_list_becomes_button() {
        let m = manifest();
        let mut seq = at(5);
        let Presentation::Stage(p) = seq.present(&m) else { panic!("expected stage") };
        assert!(matches!(p.body, StageBody::Button { .. }));
        assert!(seq.resolve(&m, Choice::Press).is_some());
    }

    #[test]
    fn unknown_type_and_missing_stage_need_recovery() {
        let m = manifest();
        let mut seq = at(6);
        assert_eq!(seq.present(&m), Presentation::Recovery(StageError::UnknownType(6)));
        let mut seq = at(7);
        assert_eq!(seq.present(&m), Presentation::Recovery(StageError::Missing(7)));
        assert_eq!(seq.step_back(), 6);
        assert_eq!(seq.phase(), Phase::Idle);
    }

    #[test]
    fn step_back_stops_at_zero() {
        let mut seq = at(0);
        assert_eq!(seq.step_back(), 0);
    }

    #[test]
    fn finish_is_terminal_until_restart() {
        let m = QuestManifest::from_json(
            r#"{ "stages": [ { "type": "action", "actionType": "button" } ] }"#,
        )
        .unwrap();
        let mut seq = StageSequencer::new(1);
        assert!(!seq.finish());
        seq.present(&m);
        seq.resolve(&m, Choice::Press);
        assert!(seq.finish());
        assert!(seq.is_completed());
        assert_eq!(seq.current(), 1);
        assert_eq!(seq.present(&m), Presentation::Finished);
        assert_eq!(seq.advance_to(1), Err(AdvanceRejected::PastEnd { target: 1, total: 1 }));

        seq.restart();
        assert_eq!(seq.current(), 0);
        assert_eq!(seq.phase(), Phase::Idle);
    }

    #[test]
    fn restore_clamps() {
        let seq = at(99);
        assert_eq!(seq.current(), 7);
    }
}
