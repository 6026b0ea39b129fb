pub mod api;
pub mod assets;
pub mod audio;
pub mod bridge;
pub mod core;
pub mod input;
pub mod layout;

// Re-export key types at crate root for convenience
pub use api::config::QuestConfig;
pub use api::quest::Quest;
pub use api::types::{FeedbackTone, SoundEvent};
pub use assets::manifest::{
    ActionKind, ContentMedia, FinalSummary, ManifestError, QuestManifest, StageDef,
};
pub use audio::{AudioState, MediaKind, Playlist};
pub use bridge::protocol::{CommandBuffer, UiCommand, POINT_FLOATS};
pub use core::progress::{ProgressRecord, ProgressStore};
pub use core::screen::{Screen, ScreenState};
pub use core::sequencer::{Choice, Presentation, StageSequencer};
pub use core::storage::{Clock, FixedClock, KeyValueStore, MemoryStore, StorageError, SystemClock};
pub use core::timers::{TimerId, TimerQueue};
pub use input::queue::{InputEvent, InputQueue};
pub use layout::{layout, LayoutMode, MapCamera, MapPoint, PointBuffer, PointInstance, RedrawGuard};
