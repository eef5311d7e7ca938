use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use console::style;
use std::time::Duration;
use storynook_core::{Story, StoryId, StoryKind};
use storynook_library::{AddStoryRequest, LibraryConfig, StoryLibrary};
use storynook_playback::{
    LoopbackConnector, MediaItem, PlaybackController, PlaybackPhase, PlayerEvent,
    DEFAULT_SEEK_INCREMENT,
};

async fn open_library(db_path: &str, media_dir: &str) -> Result<StoryLibrary> {
    StoryLibrary::new(LibraryConfig::new(db_path, media_dir))
        .await
        .context("Failed to open the story library")
}

fn parse_story_id(matches: &ArgMatches, name: &str) -> Result<StoryId> {
    let raw = matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("Story ID is required"))?;
    let id = raw
        .parse::<i64>()
        .with_context(|| format!("Invalid story ID: {}", raw))?;
    Ok(StoryId::from_i64(id))
}

fn print_story_summary(story: &Story) {
    println!(
        "[{}] {} {}",
        style(story.id).bold(),
        style(&story.title).cyan(),
        style(format!("({})", story.kind)).dim(),
    );
    if !story.voiced_by.is_empty() {
        println!("    Voiced by: {}", story.voiced_by);
    }
    println!("    Audio: {}", story.audio_path.display());
    if let Some(image) = &story.image_path {
        println!("    Image: {}", image.display());
    }
}

/// Initialize the database and media directory
pub async fn init_library(db_path: &str, media_dir: &str) -> Result<()> {
    let library = open_library(db_path, media_dir).await?;
    println!("{} Library initialized", style("✓").green().bold());
    println!("  Database: {}", db_path);
    println!("  Media: {}", library.media_store().root().display());
    Ok(())
}

/// List all stories in the library
pub async fn list_stories(db_path: &str, media_dir: &str, matches: &ArgMatches) -> Result<()> {
    let library = open_library(db_path, media_dir).await?;
    let mut stories = library
        .list_stories()
        .await
        .context("Failed to list stories")?;

    if matches.get_flag("songs") {
        stories.retain(|story| story.kind == StoryKind::Song);
    }

    if stories.is_empty() {
        println!("No stories in library. Use 'add' to import a recording.");
        return Ok(());
    }

    println!("\n{} Stories in Library", style(stories.len()).bold().cyan());
    println!("{}", "=".repeat(60));
    for story in &stories {
        print_story_summary(story);
    }

    Ok(())
}

/// Add a story, importing its media files
pub async fn add_story(db_path: &str, media_dir: &str, matches: &ArgMatches) -> Result<()> {
    let audio = matches
        .get_one::<String>("audio")
        .ok_or_else(|| anyhow!("Audio path is required"))?;

    let kind = match matches.get_one::<String>("kind").map(|s| s.as_str()) {
        Some("song") => StoryKind::Song,
        _ => StoryKind::Story,
    };

    let title = matches
        .get_one::<String>("title")
        .cloned()
        .unwrap_or_else(|| {
            std::path::Path::new(audio)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        });

    let mut request = AddStoryRequest::new(audio).with_title(title).with_kind(kind);
    if let Some(voiced_by) = matches.get_one::<String>("voiced-by") {
        request = request.with_voiced_by(voiced_by);
    }
    if let Some(image) = matches.get_one::<String>("image") {
        request = request.with_image(image);
    }

    let library = open_library(db_path, media_dir).await?;
    let story = library
        .add_story(request)
        .await
        .context("Failed to add story")?;

    println!("{} Story added!", style("✓").green().bold());
    print_story_summary(&story);

    Ok(())
}

/// Show detailed information about a story
pub async fn show_story_info(db_path: &str, media_dir: &str, matches: &ArgMatches) -> Result<()> {
    let id = parse_story_id(matches, "id")?;
    let library = open_library(db_path, media_dir).await?;
    let story = library
        .get_story(id)
        .await
        .with_context(|| format!("Failed to get story {}", id))?;

    println!("\n{}", style("Story Information").bold().cyan());
    println!("{}", "=".repeat(60));
    println!("ID: {}", story.id);
    println!("Title: {}", style(&story.title).bold());
    println!("Kind: {}", story.kind);
    if !story.voiced_by.is_empty() {
        println!("Voiced by: {}", story.voiced_by);
    }
    println!("Audio: {}", story.audio_path.display());
    match &story.image_path {
        Some(image) => println!("Image: {}", image.display()),
        None => println!("Image: (none)"),
    }

    Ok(())
}

/// Delete a story and its media files
pub async fn delete_story(db_path: &str, media_dir: &str, matches: &ArgMatches) -> Result<()> {
    let id = parse_story_id(matches, "id")?;
    let library = open_library(db_path, media_dir).await?;
    library
        .delete_story(id)
        .await
        .with_context(|| format!("Failed to delete story {}", id))?;

    println!("{} Story {} deleted", style("✓").green().bold(), id);
    Ok(())
}

/// Run one reconcile pass
pub async fn reconcile(db_path: &str, media_dir: &str) -> Result<()> {
    let library = open_library(db_path, media_dir).await?;
    let report = library
        .reconcile()
        .await
        .context("Reconcile pass failed")?;

    if report.is_clean() {
        println!("{} Library is consistent", style("✓").green().bold());
    } else {
        println!("{} Repairs made:", style("✓").green().bold());
        println!("  Orphan files removed: {}", report.orphans_removed);
        println!("  Broken stories purged: {}", report.stories_removed);
        println!("  Dangling images cleared: {}", report.images_cleared);
    }

    Ok(())
}

/// Show library statistics
pub async fn show_stats(db_path: &str, media_dir: &str) -> Result<()> {
    let library = open_library(db_path, media_dir).await?;
    let stats = library.stats().await.context("Failed to compute stats")?;

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(60));
    println!("Total recordings: {}", stats.total_stories);
    println!("  Stories: {}", stats.story_count);
    println!("  Songs: {}", stats.song_count);
    println!("  With thumbnail: {}", stats.with_image);

    Ok(())
}

/// Drive a story through the playback controller
pub async fn play_story(db_path: &str, media_dir: &str, matches: &ArgMatches) -> Result<()> {
    let id = parse_story_id(matches, "id")?;
    let library = open_library(db_path, media_dir).await?;
    let story = library
        .get_story(id)
        .await
        .with_context(|| format!("Failed to get story {}", id))?;

    let queued: Vec<Story> = match matches.get_many::<String>("queue") {
        Some(ids) => {
            let mut stories = Vec::new();
            for raw in ids {
                let id = raw
                    .parse::<i64>()
                    .with_context(|| format!("Invalid story ID: {}", raw))?;
                stories.push(library.get_story(StoryId::from_i64(id)).await?);
            }
            stories
        }
        None => Vec::new(),
    };

    let connector = LoopbackConnector::new();
    let handle = connector.handle();
    let controller = PlaybackController::new(connector);
    let mut snapshots = controller.subscribe();

    controller
        .handle(PlayerEvent::Start(MediaItem::for_story(&story)))
        .await
        .context("Failed to start playback")?;
    for story in &queued {
        controller
            .handle(PlayerEvent::Queue(MediaItem::for_story(story)))
            .await?;
    }

    snapshots
        .wait_for(|snapshot| snapshot.phase == PlaybackPhase::Playing)
        .await
        .context("Session never confirmed playback")?;
    println!("{} Playing: {}", style("▶").green().bold(), story.title);

    controller
        .handle(PlayerEvent::SeekForward(DEFAULT_SEEK_INCREMENT))
        .await?;
    println!(
        "{} Skipped ahead to {}ms",
        style("↷").dim(),
        handle.position_ms()
    );

    // No audio backend here; step through the queue and wind down
    for story in &queued {
        tokio::time::sleep(Duration::from_millis(200)).await;
        controller.handle(PlayerEvent::Next).await?;
        println!("{} Next: {}", style("▶").green().bold(), story.title);
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.end_of_media();
    snapshots
        .wait_for(|snapshot| snapshot.phase == PlaybackPhase::Stopped)
        .await
        .context("Session never reported the end of playback")?;
    println!("{} Finished", style("■").dim());

    controller.handle(PlayerEvent::Release).await?;
    Ok(())
}
