//! Storynook playback
//!
//! Event-driven playback control over an abstract media session. The
//! [`PlaybackController`] accepts [`PlayerEvent`]s, drives a session
//! obtained from a [`SessionConnector`], and publishes
//! [`PlaybackSnapshot`]s over a watch channel.

pub mod controller;
pub mod error;
pub mod session;
pub mod state;

pub use controller::{PlaybackController, PlayerEvent};
pub use error::{PlaybackError, Result};
pub use session::{
    LoopbackConnector, LoopbackHandle, LoopbackSession, MediaSession, SessionConnection,
    SessionConnector, SessionEvent,
};
pub use state::{MediaItem, PlaybackPhase, PlaybackSnapshot, DEFAULT_SEEK_INCREMENT};
