//! Integration tests for the playback controller phase machine

use std::time::Duration;
use storynook_playback::{
    LoopbackConnector, MediaItem, PlaybackController, PlaybackPhase, PlayerEvent,
    DEFAULT_SEEK_INCREMENT,
};

fn item(uri: &str) -> MediaItem {
    MediaItem::new(uri).with_title(uri)
}

async fn wait_for_phase(controller: &PlaybackController, phase: PlaybackPhase) {
    let mut listing = controller.subscribe();
    listing
        .wait_for(|snapshot| snapshot.phase == phase)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_start_reaches_playing_on_confirmation() {
    let connector = LoopbackConnector::new();
    let handle = connector.handle();
    let controller = PlaybackController::new(connector);

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();

    wait_for_phase(&controller, PlaybackPhase::Playing).await;
    assert!(handle.is_playing());
    assert_eq!(handle.current_uri().as_deref(), Some("/media/a.mp4"));
}

#[tokio::test]
async fn test_start_replaces_queue() {
    let controller = PlaybackController::new(LoopbackConnector::new());

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    controller
        .handle(PlayerEvent::Queue(item("/media/b.mp4")))
        .await
        .unwrap();
    controller
        .handle(PlayerEvent::Start(item("/media/c.mp4")))
        .await
        .unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue[0].uri, "/media/c.mp4");
    assert_eq!(snapshot.current.unwrap().uri, "/media/c.mp4");
}

#[tokio::test]
async fn test_pause_and_resume() {
    let controller = PlaybackController::new(LoopbackConnector::new());

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;

    controller.handle(PlayerEvent::Pause).await.unwrap();
    wait_for_phase(&controller, PlaybackPhase::Paused).await;

    controller.handle(PlayerEvent::Resume).await.unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;
}

#[tokio::test]
async fn test_relative_seeks() {
    let connector = LoopbackConnector::new();
    let handle = connector.handle();
    let controller = PlaybackController::new(connector);

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();

    controller
        .handle(PlayerEvent::SeekForward(DEFAULT_SEEK_INCREMENT))
        .await
        .unwrap();
    assert_eq!(handle.position_ms(), 10_000);

    controller
        .handle(PlayerEvent::SeekForward(DEFAULT_SEEK_INCREMENT))
        .await
        .unwrap();
    assert_eq!(handle.position_ms(), 20_000);

    // Rewinding past the start clamps to zero
    controller
        .handle(PlayerEvent::SeekBackward(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(handle.position_ms(), 0);
}

#[tokio::test]
async fn test_queue_next_previous_boundaries() {
    let connector = LoopbackConnector::new();
    let handle = connector.handle();
    let controller = PlaybackController::new(connector);

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    controller
        .handle(PlayerEvent::Queue(item("/media/b.mp4")))
        .await
        .unwrap();
    assert_eq!(handle.queue_len(), 2);

    // No wraparound backwards from the first item
    controller.handle(PlayerEvent::Previous).await.unwrap();
    assert_eq!(controller.snapshot().current.unwrap().uri, "/media/a.mp4");

    controller.handle(PlayerEvent::Next).await.unwrap();
    assert_eq!(controller.snapshot().current.unwrap().uri, "/media/b.mp4");

    // No wraparound forwards from the last item
    controller.handle(PlayerEvent::Next).await.unwrap();
    assert_eq!(controller.snapshot().current.unwrap().uri, "/media/b.mp4");

    controller.handle(PlayerEvent::Previous).await.unwrap();
    assert_eq!(controller.snapshot().current.unwrap().uri, "/media/a.mp4");
}

#[tokio::test]
async fn test_end_of_media_stops_and_clears_current() {
    let connector = LoopbackConnector::new();
    let handle = connector.handle();
    let controller = PlaybackController::new(connector);

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;

    handle.end_of_media();
    wait_for_phase(&controller, PlaybackPhase::Stopped).await;
    assert!(controller.snapshot().current.is_none());
}

#[tokio::test]
async fn test_release_returns_to_uninitialised() {
    let controller = PlaybackController::new(LoopbackConnector::new());

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;

    controller.handle(PlayerEvent::Release).await.unwrap();

    let snapshot = controller.snapshot();
    assert!(snapshot.is_idle());
    assert!(snapshot.queue.is_empty());
    assert!(snapshot.current.is_none());
}

#[tokio::test]
async fn test_commands_after_release_are_noops() {
    let controller = PlaybackController::new(LoopbackConnector::new());

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;
    controller.handle(PlayerEvent::Release).await.unwrap();

    controller.handle(PlayerEvent::Pause).await.unwrap();
    controller.handle(PlayerEvent::Resume).await.unwrap();
    controller
        .handle(PlayerEvent::SeekForward(Duration::from_secs(10)))
        .await
        .unwrap();

    assert!(controller.snapshot().is_idle());
}

#[tokio::test]
async fn test_start_after_release_reconnects() {
    let controller = PlaybackController::new(LoopbackConnector::new());

    controller
        .handle(PlayerEvent::Start(item("/media/a.mp4")))
        .await
        .unwrap();
    controller.handle(PlayerEvent::Release).await.unwrap();

    controller
        .handle(PlayerEvent::Start(item("/media/b.mp4")))
        .await
        .unwrap();
    wait_for_phase(&controller, PlaybackPhase::Playing).await;
    assert_eq!(controller.snapshot().current.unwrap().uri, "/media/b.mp4");
}
