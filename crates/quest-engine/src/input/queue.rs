use crate::audio::MediaKind;

/// Player and page events the quest understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// "Start" on the start screen.
    Start,
    /// Kickoff button after the start hint.
    Kickoff,
    /// Restore prompt: continue from the saved stage.
    RestoreAccepted,
    /// Restore prompt: start over.
    RestoreDeclined,
    /// "Play again" on the final screen.
    Restart,
    /// A question option, item or place was picked.
    SelectOption { index: usize },
    /// The single action button of a button stage.
    ActionPressed,
    /// A tap inside the penalty goal area, in area-local pixels.
    PenaltyShot { x: f32, y: f32, area_width: f32, area_height: f32 },
    /// "Continue" under the feedback.
    Continue,
    /// "Next" in the content modal.
    ModalNext,
    /// Modal closed with the cross or the backdrop.
    ModalClose,
    /// A map marker was tapped.
    PointTapped { index: usize },
    /// Tap on the start hint.
    DismissStartHint,
    ToggleMusic,
    /// The background track finished.
    MusicEnded,
    /// Music `play()` was rejected.
    MusicFailed,
    /// Content media finished loading.
    MediaLoaded,
    MediaFailed { kind: MediaKind },
    Resize { width: f32, height: f32 },
}

/// A queue of input events.
/// The page pushes events through the bridge; the quest drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
