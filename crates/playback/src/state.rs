//! Playback state types

use std::time::Duration;
use storynook_core::Story;

/// Default step for relative seeks
pub const DEFAULT_SEEK_INCREMENT: Duration = Duration::from_millis(10_000);

/// Lifecycle phase of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// No session has ever been started, or it was released
    #[default]
    Uninitialised,
    Playing,
    Paused,
    /// The current item ran to its end
    Stopped,
}

impl PlaybackPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackPhase::Playing | PlaybackPhase::Paused)
    }
}

/// One playable item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Location of the audio, as the session understands it
    pub uri: String,
    /// Human-readable label for displays
    pub title: String,
}

impl MediaItem {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builds an item from a library story
    pub fn for_story(story: &Story) -> Self {
        Self {
            uri: story.audio_path.display().to_string(),
            title: story.title.clone(),
        }
    }
}

/// Point-in-time view of the controller, published to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    /// Item the session is currently on, if any
    pub current: Option<MediaItem>,
    /// Full queue, including the current item
    pub queue: Vec<MediaItem>,
}

impl PlaybackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn is_idle(&self) -> bool {
        self.phase == PlaybackPhase::Uninitialised
    }
}
