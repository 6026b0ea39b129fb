use serde::{Deserialize, Serialize};

use crate::layout::LayoutMode;

/// Tunables for a quest, provided by the manifest's `settings` block.
/// Every field has a default, so the block (or any field in it) may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestConfig {
    /// localStorage key for the progress record.
    pub progress_key: String,
    /// Which map heuristic places the stage markers.
    pub layout_mode: LayoutMode,
    /// Minimum distance in pixels between a marker and the viewport edge.
    pub layout_padding: f32,
    /// Viewport widths at or below this are treated as mobile.
    pub mobile_breakpoint: f32,
    /// Viewport used when the page reports a non-positive size.
    pub fallback_viewport: [f32; 2],
    /// Duration of the character run between two markers.
    pub character_speed_ms: u32,
    /// Idle time on the map before the next marker is hinted.
    pub hint_delay_ms: u32,
    /// How long the kickoff hint stays up before hiding itself.
    pub start_hint_ms: u32,
    /// Quiet period after the last resize before the map is redrawn.
    pub resize_debounce_ms: u32,
    /// Settle time before a requested map redraw runs.
    pub redraw_delay_ms: u32,
    /// Pause between arriving on the task screen and showing the stage.
    pub stage_present_delay_ms: u32,
    pub music_volume: f32,
    pub sound_effects_volume: f32,
    /// Background tracks, played in order and looped.
    pub music_tracks: Vec<String>,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            progress_key: "footballQuest30_progress".to_string(),
            layout_mode: LayoutMode::Formation,
            layout_padding: 24.0,
            mobile_breakpoint: 768.0,
            fallback_viewport: [1920.0, 1080.0],
            character_speed_ms: 1500,
            hint_delay_ms: 10_000,
            start_hint_ms: 5_000,
            resize_debounce_ms: 300,
            redraw_delay_ms: 200,
            stage_present_delay_ms: 500,
            music_volume: 0.3,
            sound_effects_volume: 0.5,
            music_tracks: vec![
                "./assets/audio/holigan.mp3".to_string(),
                "./assets/audio/medlyak.mp3".to_string(),
            ],
        }
    }
}

impl QuestConfig {
    pub fn is_mobile(&self, viewport_width: f32) -> bool {
        viewport_width <= self.mobile_breakpoint
    }
}
