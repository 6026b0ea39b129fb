use glam::Vec2;
use quest_engine::{InputEvent, InputQueue, ManifestError, Quest};

use crate::storage::{JsClock, LocalStorage};

/// Owns the quest session for the page and buffers input between frames.
///
/// The page keeps one runner in a `thread_local!` and reaches it through the
/// free `#[wasm_bindgen]` functions in `lib.rs`, because wasm-bindgen cannot
/// export generic structs directly.
pub struct QuestRunner {
    quest: Quest<LocalStorage, JsClock>,
    input: InputQueue,
}

impl QuestRunner {
    pub fn new(manifest_json: &str, viewport: Vec2) -> Result<Self, ManifestError> {
        let quest = Quest::from_json(manifest_json, LocalStorage::from_window(), JsClock, viewport)?;
        Ok(Self {
            quest,
            input: InputQueue::new(),
        })
    }

    /// Load progress and show the first screen. Call once after construction.
    pub fn init(&mut self) {
        self.quest.init();
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: apply queued input, then advance timers by `dt_ms`.
    pub fn tick(&mut self, dt_ms: f64) {
        self.quest.update(dt_ms, &self.input);
        self.input.drain();
    }

    /// Pending UI commands as a JSON array. Never fails: on a serialization
    /// error the batch is dropped and logged.
    pub fn drain_commands_json(&mut self) -> String {
        match self.quest.commands_mut().drain_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("quest-web: failed to encode commands: {}", e);
                "[]".to_string()
            }
        }
    }

    // ---- Pointer accessors for direct memory reads ----

    pub fn points_ptr(&self) -> *const f32 {
        self.quest.point_buffer().points_ptr()
    }

    pub fn point_count(&self) -> u32 {
        self.quest.point_buffer().point_count()
    }

    pub fn current_stage(&self) -> u32 {
        self.quest.current_stage() as u32
    }

    pub fn total_stages(&self) -> u32 {
        self.quest.total_stages() as u32
    }
}
