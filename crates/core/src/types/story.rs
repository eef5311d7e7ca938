//! Story domain model

use crate::types::Validator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Unique identifier for a story, assigned by the database on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoryId(i64);

impl StoryId {
    /// Wraps a raw database id
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database id
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of recording: a spoken tale or a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoryKind {
    #[default]
    Story,
    Song,
}

impl StoryKind {
    /// Integer representation used in the database
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Story => 0,
            Self::Song => 1,
        }
    }

    /// Parses the database integer representation
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Story),
            1 => Some(Self::Song),
            _ => None,
        }
    }
}

impl fmt::Display for StoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Story => write!(f, "story"),
            Self::Song => write!(f, "song"),
        }
    }
}

/// A persisted audio-narration record with optional thumbnail
///
/// Both paths point into the library's private media directory. A story
/// whose audio file no longer resolves is invalid and gets purged by the
/// reconciler; a dangling image reference is cleared instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub voiced_by: String,
    pub kind: StoryKind,
    pub image_path: Option<PathBuf>,
    pub audio_path: PathBuf,
}

impl Story {
    /// Returns true if the story has a thumbnail attached
    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }

    /// Clears the thumbnail reference, keeping the record itself
    pub fn clear_image(&mut self) {
        self.image_path = None;
    }
}

impl Validator for Story {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.audio_path.as_os_str().is_empty() {
            errors.push("Audio path cannot be empty".to_string());
        }

        if let Some(image) = &self.image_path {
            if image.as_os_str().is_empty() {
                errors.push("Image path cannot be empty when present".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A story that has not been persisted yet; the database assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub voiced_by: String,
    pub kind: StoryKind,
    pub image_path: Option<PathBuf>,
    pub audio_path: PathBuf,
}

impl NewStory {
    /// Creates a new story draft with the required audio reference
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            title: String::new(),
            voiced_by: String::new(),
            kind: StoryKind::Story,
            image_path: None,
            audio_path: audio_path.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_voiced_by(mut self, voiced_by: impl Into<String>) -> Self {
        self.voiced_by = voiced_by.into();
        self
    }

    pub fn with_kind(mut self, kind: StoryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_image(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    /// Attaches the assigned id, producing the persisted form
    pub fn into_story(self, id: StoryId) -> Story {
        Story {
            id,
            title: self.title,
            voiced_by: self.voiced_by,
            kind: self.kind,
            image_path: self.image_path,
            audio_path: self.audio_path,
        }
    }
}

impl Validator for NewStory {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.audio_path.as_os_str().is_empty() {
            errors.push("Audio path cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
