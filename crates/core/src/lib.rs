//! Storynook core types
//!
//! Domain models and the shared error type used by every other crate in
//! the workspace.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use types::{NewStory, Story, StoryId, StoryKind, Validator};
