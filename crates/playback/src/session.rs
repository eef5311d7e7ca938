//! Media session seam
//!
//! The controller never talks to a platform player directly; it drives a
//! [`MediaSession`] obtained through a [`SessionConnector`]. The session
//! reports back over a channel, so confirmation of play/pause and
//! end-of-media arrive as messages rather than shared mutable state.
//!
//! A [`LoopbackSession`] ships with the crate: it acknowledges every
//! command by emitting the matching event, which is enough for tests and
//! for driving the controller without an audio backend.

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Notification from the session back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session started or stopped producing audio
    PlayingChanged(bool),
    /// The current item ran to its end
    Ended,
}

/// Command surface of a platform media session
pub trait MediaSession: Send {
    /// Replaces the session's content with a single item
    fn load(&mut self, uri: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;
    fn position_ms(&self) -> Result<u64>;
    /// Appends an item after the session's current content
    fn enqueue(&mut self, uri: &str) -> Result<()>;
    fn next(&mut self) -> Result<()>;
    fn previous(&mut self) -> Result<()>;
    /// Stops the session; called once when the connection is dropped
    fn stop(&mut self);
}

/// Asynchronous factory for media sessions
///
/// Binding may take arbitrarily long. Events issued while the bind is
/// still pending are dropped, not queued; callers see that as the
/// controller staying disconnected until `connect` resolves.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(
        &self,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Box<dyn MediaSession>>;
}

/// A live session together with its event-pump task
///
/// Dropping the connection stops the session and aborts the pump, so a
/// connection registers for events exactly once and unregisters exactly
/// once, with no separate release call to forget.
pub struct SessionConnection {
    session: Box<dyn MediaSession>,
    event_task: JoinHandle<()>,
}

impl SessionConnection {
    pub fn new(session: Box<dyn MediaSession>, event_task: JoinHandle<()>) -> Self {
        Self {
            session,
            event_task,
        }
    }

    pub fn session(&mut self) -> &mut dyn MediaSession {
        &mut *self.session
    }
}

impl Drop for SessionConnection {
    fn drop(&mut self) {
        self.session.stop();
        self.event_task.abort();
    }
}

#[derive(Debug, Default)]
struct LoopbackState {
    queue: Vec<String>,
    index: usize,
    position_ms: u64,
    playing: bool,
}

fn lock(state: &Mutex<LoopbackState>) -> MutexGuard<'_, LoopbackState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory session that acknowledges commands by emitting events
pub struct LoopbackSession {
    state: Arc<Mutex<LoopbackState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl LoopbackSession {
    fn set_playing(&self, playing: bool) {
        lock(&self.state).playing = playing;
        let _ = self.events.send(SessionEvent::PlayingChanged(playing));
    }
}

impl MediaSession for LoopbackSession {
    fn load(&mut self, uri: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.queue = vec![uri.to_string()];
        state.index = 0;
        state.position_ms = 0;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if lock(&self.state).queue.is_empty() {
            return Err(PlaybackError::NothingLoaded);
        }
        self.set_playing(true);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.set_playing(false);
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        lock(&self.state).position_ms = position_ms;
        Ok(())
    }

    fn position_ms(&self) -> Result<u64> {
        Ok(lock(&self.state).position_ms)
    }

    fn enqueue(&mut self, uri: &str) -> Result<()> {
        lock(&self.state).queue.push(uri.to_string());
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.index + 1 < state.queue.len() {
            state.index += 1;
            state.position_ms = 0;
        }
        Ok(())
    }

    fn previous(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.index > 0 {
            state.index -= 1;
            state.position_ms = 0;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.set_playing(false);
    }
}

/// Connector producing [`LoopbackSession`]s
#[derive(Clone, Default)]
pub struct LoopbackConnector {
    state: Arc<Mutex<LoopbackState>>,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<SessionEvent>>>>,
    refuse: bool,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose bind always fails
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Returns a handle for inspecting and driving the session externally
    pub fn handle(&self) -> LoopbackHandle {
        LoopbackHandle {
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
        }
    }
}

#[async_trait]
impl SessionConnector for LoopbackConnector {
    async fn connect(
        &self,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Box<dyn MediaSession>> {
        if self.refuse {
            return Err(PlaybackError::ConnectFailed(
                "loopback connector refused the bind".to_string(),
            ));
        }

        *self
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(events.clone());

        Ok(Box::new(LoopbackSession {
            state: Arc::clone(&self.state),
            events,
        }))
    }
}

/// External view of a loopback session
pub struct LoopbackHandle {
    state: Arc<Mutex<LoopbackState>>,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<SessionEvent>>>>,
}

impl LoopbackHandle {
    /// Signals that the current item ran to its end
    pub fn end_of_media(&self) {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = events.as_ref() {
            let _ = sender.send(SessionEvent::Ended);
        }
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    pub fn position_ms(&self) -> u64 {
        lock(&self.state).position_ms
    }

    /// Uri the session is currently on, if anything is loaded
    pub fn current_uri(&self) -> Option<String> {
        let state = lock(&self.state);
        state.queue.get(state.index).cloned()
    }

    pub fn queue_len(&self) -> usize {
        lock(&self.state).queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session() -> (LoopbackSession, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = LoopbackSession {
            state: Arc::default(),
            events: tx,
        };
        (session, rx)
    }

    #[test]
    fn test_play_requires_loaded_media() {
        let (mut session, _rx) = open_session();
        assert!(matches!(session.play(), Err(PlaybackError::NothingLoaded)));

        session.load("/media/a.mp4").unwrap();
        assert!(session.play().is_ok());
    }

    #[test]
    fn test_play_pause_emit_events() {
        let (mut session, mut rx) = open_session();
        session.load("/media/a.mp4").unwrap();

        session.play().unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::PlayingChanged(true));

        session.pause().unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::PlayingChanged(false));
    }

    #[test]
    fn test_load_resets_queue_and_position() {
        let (mut session, _rx) = open_session();
        session.load("/media/a.mp4").unwrap();
        session.enqueue("/media/b.mp4").unwrap();
        session.seek_to(5_000).unwrap();

        session.load("/media/c.mp4").unwrap();
        assert_eq!(session.position_ms().unwrap(), 0);
        assert_eq!(lock(&session.state).queue, vec!["/media/c.mp4"]);
    }

    #[test]
    fn test_next_previous_clamp_at_boundaries() {
        let (mut session, _rx) = open_session();
        session.load("/media/a.mp4").unwrap();
        session.enqueue("/media/b.mp4").unwrap();

        session.previous().unwrap();
        assert_eq!(lock(&session.state).index, 0);

        session.next().unwrap();
        assert_eq!(lock(&session.state).index, 1);

        session.next().unwrap();
        assert_eq!(lock(&session.state).index, 1);
    }

    #[tokio::test]
    async fn test_refusing_connector() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = LoopbackConnector::refusing().connect(tx).await;
        assert!(matches!(result, Err(PlaybackError::ConnectFailed(_))));
    }
}
