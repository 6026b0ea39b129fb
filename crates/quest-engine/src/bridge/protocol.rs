/// Engine → page protocol.
/// Must stay in sync with the page script that applies the commands.
///
/// Two channels cross the boundary every frame:
/// ```text
/// [Commands: JSON array of UiCommand, drained by the page]
/// [Points:   point_count × POINT_FLOATS f32, read through a pointer]
/// ```
///
/// Commands describe DOM changes (screens, text, animations, audio). The
/// point buffer carries the map markers; a `drawMap` command tells the page
/// when to re-read it.
use serde::Serialize;

use crate::api::types::{FeedbackTone, SoundEvent};
use crate::assets::manifest::{ContentMedia, FinalSummary};
use crate::core::screen::Screen;
use crate::core::sequencer::StagePresentation;
use crate::layout::Side;

/// Floats per map point in the point buffer (wire format — never changes).
pub const POINT_FLOATS: usize = 8;

/// Protocol version, sent with the first `drawMap`.
pub const PROTOCOL_VERSION: u32 = 1;

/// A single instruction for the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UiCommand {
    ShowScreen { screen: Screen },
    SetProgressLabel { text: String },
    /// 1-based stage number for the restore prompt.
    ShowRestorePrompt { stage_number: usize },
    PresentStage { stage: StagePresentation },
    /// Highlight the picked option and, for questions, the right one.
    MarkAnswer {
        selected: Option<usize>,
        correct_option: Option<usize>,
        correct: bool,
    },
    /// Drop the ball where a penalty shot landed.
    ShowShot { x: f32, y: f32 },
    ShowFeedback { text: String, tone: FeedbackTone },
    ShowContinue,
    ShowContent {
        title: String,
        caption: String,
        media: ContentMedia,
    },
    CloseModal,
    ShowLoader,
    HideLoader,
    /// Rebuild the markers from the point buffer.
    DrawMap {
        point_count: usize,
        current_stage: usize,
        mobile: bool,
        version: u32,
    },
    MoveCamera { x: f32, y: f32, instant: bool },
    /// Place the character without animation.
    PositionCharacter { x: f32, y: f32, z: f32, facing_deg: f32 },
    /// Run the character to a marker.
    MoveCharacter {
        x: f32,
        y: f32,
        z: f32,
        facing_deg: f32,
        duration_ms: u32,
    },
    /// Place the ball without animation.
    PlaceBall { x: f32, y: f32 },
    /// Animate the ball towards a point.
    MoveBall { x: f32, y: f32, duration_ms: u32 },
    SetBallFlying { flying: bool },
    ShowStartHint,
    HideStartHint,
    ShowKickoff,
    HideKickoff,
    /// Hint bubble next to the next marker.
    ShowHint { index: usize, x: f32, y: f32 },
    HideHint,
    /// Wobble a marker that cannot be chosen yet.
    RejectTap { index: usize, side: Side },
    PlayMusic { track: String, volume: f32 },
    PauseMusic,
    SetMusicIcon { playing: bool },
    DisableMusicControl,
    PlaySound { sound: SoundEvent, volume: f32 },
    /// Replace a broken image or video with a text placeholder.
    MediaPlaceholder { text: String },
    ShowFinal { summary: FinalSummary },
    Confetti,
}

/// Commands produced during a frame, in order.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<UiCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, command: UiCommand) {
        self.commands.push(command);
    }

    pub fn drain(&mut self) -> Vec<UiCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UiCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drain into a JSON array for the page.
    pub fn drain_json(&mut self) -> Result<String, serde_json::Error> {
        let commands = self.drain();
        serde_json::to_string(&commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_tagged() {
        let json = serde_json::to_value(UiCommand::ShowScreen { screen: Screen::Map }).unwrap();
        assert_eq!(json["cmd"], "showScreen");
        assert_eq!(json["screen"], "map");

        let json = serde_json::to_value(UiCommand::ShowRestorePrompt { stage_number: 6 }).unwrap();
        assert_eq!(json["cmd"], "showRestorePrompt");
        assert_eq!(json["stageNumber"], 6);
    }

    #[test]
    fn unit_commands_carry_only_the_tag() {
        let json = serde_json::to_string(&UiCommand::Confetti).unwrap();
        assert_eq!(json, r#"{"cmd":"confetti"}"#);
    }

    #[test]
    fn drain_json_empties_the_buffer() {
        let mut buf = CommandBuffer::new();
        buf.push(UiCommand::ShowLoader);
        buf.push(UiCommand::HideLoader);
        assert_eq!(buf.len(), 2);
        let json = buf.drain_json().unwrap();
        assert_eq!(json, r#"[{"cmd":"showLoader"},{"cmd":"hideLoader"}]"#);
        assert!(buf.is_empty());
        assert_eq!(buf.drain_json().unwrap(), "[]");
    }

    #[test]
    fn point_stride_matches_instance() {
        assert_eq!(
            POINT_FLOATS * 4,
            std::mem::size_of::<crate::layout::PointInstance>()
        );
    }
}
