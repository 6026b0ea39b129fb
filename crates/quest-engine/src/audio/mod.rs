// audio/mod.rs
//
// Music and sound-effect state. The page owns the <audio> elements; this
// module decides what they should do and reports it as MusicAction values.

pub mod playlist;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::SoundEvent;
pub use playlist::Playlist;

/// Kinds of media the page may fail to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Music,
    Sound,
    Image,
    Video,
}

impl MediaKind {
    /// Decode the numeric kind passed across the wasm boundary.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MediaKind::Music),
            1 => Some(MediaKind::Sound),
            2 => Some(MediaKind::Image),
            3 => Some(MediaKind::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("music is unavailable")]
    MusicUnavailable,
}

/// What the page should do with the music element.
#[derive(Debug, Clone, PartialEq)]
pub enum MusicAction {
    Play { track: String, volume: f32 },
    Pause,
}

/// Music toggle, playlist and sound-effect gating.
#[derive(Debug, Clone)]
pub struct AudioState {
    playlist: Playlist,
    /// Set by the first toggle; sound effects stay silent until then.
    enabled: bool,
    playing: bool,
    /// Cleared after a playback failure; the control is disabled.
    available: bool,
    music_volume: f32,
    effects_volume: f32,
}

impl AudioState {
    pub fn new(tracks: Vec<String>, music_volume: f32, effects_volume: f32) -> Self {
        Self {
            playlist: Playlist::new(tracks),
            enabled: false,
            playing: false,
            available: true,
            music_volume: music_volume.clamp(0.0, 1.0),
            effects_volume: effects_volume.clamp(0.0, 1.0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn effects_volume(&self) -> f32 {
        self.effects_volume
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    fn play_current(&mut self) -> Result<MusicAction, MediaError> {
        let track = self.playlist.current().ok_or(MediaError::MusicUnavailable)?.to_string();
        self.playing = true;
        Ok(MusicAction::Play {
            track,
            volume: self.music_volume,
        })
    }

    /// Music button. The first press enables music and starts playback;
    /// later presses pause and resume.
    pub fn toggle(&mut self) -> Result<MusicAction, MediaError> {
        if !self.available {
            return Err(MediaError::MusicUnavailable);
        }
        if !self.enabled {
            self.enabled = true;
            return self.play_current();
        }
        if self.playing {
            self.playing = false;
            Ok(MusicAction::Pause)
        } else {
            self.play_current()
        }
    }

    /// The current track finished; continue with the next one.
    pub fn track_ended(&mut self) -> Option<MusicAction> {
        self.playlist.next()?;
        if self.enabled && self.playing {
            self.play_current().ok()
        } else {
            None
        }
    }

    /// Playback failed: disable the control and move to the next track.
    /// Returns true when another track is worth retrying, which happens once.
    pub fn music_failed(&mut self) -> bool {
        let first_failure = self.available;
        self.available = false;
        self.playing = false;
        if first_failure && self.playlist.len() > 1 {
            self.playlist.next();
            true
        } else {
            false
        }
    }

    /// Retry playback on the track selected by `music_failed`.
    pub fn retry(&mut self) -> Option<MusicAction> {
        if !self.enabled {
            return None;
        }
        self.play_current().ok()
    }

    /// Sound effects play only once music has been enabled.
    pub fn sound(&self, event: SoundEvent) -> Option<SoundEvent> {
        self.enabled.then_some(event)
    }
}
