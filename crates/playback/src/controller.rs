//! Playback controller
//!
//! A single event-driven front door for playback. UI layers send
//! [`PlayerEvent`]s; the controller drives the media session and folds
//! session feedback into a phase machine that subscribers observe
//! through a watch channel.
//!
//! The phase only moves on confirmation: `Start` does not flip the
//! controller to Playing by itself, the session's `PlayingChanged(true)`
//! does. Commands sent while no session is connected are silent no-ops,
//! except `Start`, which establishes the connection.

use crate::error::Result;
use crate::session::{SessionConnection, SessionConnector, SessionEvent};
use crate::state::{MediaItem, PlaybackPhase, PlaybackSnapshot};
use log::{debug, info};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// Commands accepted by the controller
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// Replaces everything: queue becomes this single item and it plays
    Start(MediaItem),
    Pause,
    Resume,
    SeekForward(Duration),
    SeekBackward(Duration),
    /// Appends to the queue without touching the current item
    Queue(MediaItem),
    Next,
    Previous,
    /// Tears the session down; the controller returns to Uninitialised
    Release,
}

#[derive(Default)]
struct Inner {
    phase: PlaybackPhase,
    queue: Vec<MediaItem>,
    current: Option<usize>,
    connection: Option<SessionConnection>,
}

impl Inner {
    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            current: self
                .current
                .and_then(|index| self.queue.get(index).cloned()),
            queue: self.queue.clone(),
        }
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PlayingChanged(playing) => {
                // A stale confirmation can arrive after the item was
                // cleared; it must not resurrect a phase.
                if self.current.is_some() {
                    self.phase = if playing {
                        PlaybackPhase::Playing
                    } else {
                        PlaybackPhase::Paused
                    };
                }
            }
            SessionEvent::Ended => {
                debug!("Current item ended");
                self.phase = PlaybackPhase::Stopped;
                self.current = None;
            }
        }
    }
}

/// Event-driven playback front door
pub struct PlaybackController {
    connector: Arc<dyn SessionConnector>,
    inner: Arc<Mutex<Inner>>,
    snapshot: Arc<watch::Sender<PlaybackSnapshot>>,
}

impl PlaybackController {
    pub fn new(connector: impl SessionConnector + 'static) -> Self {
        let (snapshot, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            connector: Arc::new(connector),
            inner: Arc::new(Mutex::new(Inner::default())),
            snapshot: Arc::new(snapshot),
        }
    }

    /// Subscribes to controller snapshots
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.subscribe()
    }

    /// Returns the latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Handles one command
    pub async fn handle(&self, event: PlayerEvent) -> Result<()> {
        let mut inner = self.inner.lock().await;

        match event {
            PlayerEvent::Start(item) => {
                if inner.connection.is_none() {
                    inner.connection = Some(self.bind_session().await?);
                }

                info!("Starting '{}'", item.uri);
                inner.queue = vec![item.clone()];
                inner.current = Some(0);
                if let Some(connection) = inner.connection.as_mut() {
                    connection.session().load(&item.uri)?;
                    connection.session().play()?;
                }
            }
            PlayerEvent::Pause => {
                if let Some(connection) = inner.connection.as_mut() {
                    connection.session().pause()?;
                }
            }
            PlayerEvent::Resume => {
                if let Some(connection) = inner.connection.as_mut() {
                    connection.session().play()?;
                }
            }
            PlayerEvent::SeekForward(step) => {
                if let Some(connection) = inner.connection.as_mut() {
                    let position = connection.session().position_ms()?;
                    let target = position.saturating_add(step.as_millis() as u64);
                    connection.session().seek_to(target)?;
                }
            }
            PlayerEvent::SeekBackward(step) => {
                if let Some(connection) = inner.connection.as_mut() {
                    let position = connection.session().position_ms()?;
                    let target = position.saturating_sub(step.as_millis() as u64);
                    connection.session().seek_to(target)?;
                }
            }
            PlayerEvent::Queue(item) => {
                debug!("Queueing '{}'", item.uri);
                if let Some(connection) = inner.connection.as_mut() {
                    connection.session().enqueue(&item.uri)?;
                }
                inner.queue.push(item);
            }
            PlayerEvent::Next => {
                if let Some(index) = inner.current {
                    if index + 1 < inner.queue.len() {
                        inner.current = Some(index + 1);
                        if let Some(connection) = inner.connection.as_mut() {
                            connection.session().next()?;
                        }
                    }
                }
            }
            PlayerEvent::Previous => {
                if let Some(index) = inner.current {
                    if index > 0 {
                        inner.current = Some(index - 1);
                        if let Some(connection) = inner.connection.as_mut() {
                            connection.session().previous()?;
                        }
                    }
                }
            }
            PlayerEvent::Release => {
                info!("Releasing media session");
                // Dropping the connection stops the session and its pump
                inner.connection = None;
                inner.queue.clear();
                inner.current = None;
                inner.phase = PlaybackPhase::Uninitialised;
            }
        }

        self.snapshot.send_replace(inner.snapshot());
        Ok(())
    }

    /// Binds a fresh session and starts its event pump
    async fn bind_session(&self) -> Result<SessionConnection> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let pump = spawn_event_pump(
            events_rx,
            Arc::downgrade(&self.inner),
            Arc::clone(&self.snapshot),
        );

        let session = self.connector.connect(events_tx).await?;
        Ok(SessionConnection::new(session, pump))
    }
}

fn spawn_event_pump(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    inner: Weak<Mutex<Inner>>,
    snapshot: Arc<watch::Sender<PlaybackSnapshot>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(inner) = inner.upgrade() else { break };
            let mut inner = inner.lock().await;
            inner.apply_session_event(event);
            snapshot.send_replace(inner.snapshot());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LoopbackConnector;

    #[tokio::test]
    async fn test_starts_uninitialised() {
        let controller = PlaybackController::new(LoopbackConnector::new());
        assert!(controller.snapshot().is_idle());
    }

    #[tokio::test]
    async fn test_failed_bind_leaves_controller_idle() {
        let controller = PlaybackController::new(LoopbackConnector::refusing());

        let result = controller
            .handle(PlayerEvent::Start(MediaItem::new("/media/a.mp4")))
            .await;

        assert!(result.is_err());
        let snapshot = controller.snapshot();
        assert!(snapshot.is_idle());
        assert!(snapshot.queue.is_empty());
    }

    #[tokio::test]
    async fn test_commands_without_session_are_noops() {
        let controller = PlaybackController::new(LoopbackConnector::new());

        controller.handle(PlayerEvent::Pause).await.unwrap();
        controller.handle(PlayerEvent::Resume).await.unwrap();
        controller
            .handle(PlayerEvent::SeekForward(Duration::from_secs(10)))
            .await
            .unwrap();
        controller.handle(PlayerEvent::Next).await.unwrap();

        assert!(controller.snapshot().is_idle());
    }
}
