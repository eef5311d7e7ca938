//! High-level story library management

use crate::error::{LibraryError, Result};
use crate::jobs::CleanupScheduler;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::storage::MediaStore;
use log::{info, warn};
use std::path::PathBuf;
use storynook_core::{NewStory, Story, StoryId, StoryKind};
use storynook_database::{
    connect,
    queries::stories,
    run_migrations, DatabaseConfig, DbPool,
};
use tokio::sync::watch;

/// Library configuration
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Database file path
    pub database_path: String,
    /// App-private media directory
    pub media_dir: PathBuf,
    /// Run a reconcile pass whenever the listing is read
    pub reconcile_on_read: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database_path: "storynook.db".to_string(),
            media_dir: PathBuf::from("media"),
            reconcile_on_read: true,
        }
    }
}

impl LibraryConfig {
    pub fn new(database_path: impl Into<String>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            media_dir: media_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_reconcile_on_read(mut self, enabled: bool) -> Self {
        self.reconcile_on_read = enabled;
        self
    }
}

/// Request to add a story to the library
///
/// Source paths may point anywhere readable; the library copies them into
/// its own media directory before the record is written. Audio is
/// required, the thumbnail is optional.
#[derive(Debug, Clone)]
pub struct AddStoryRequest {
    pub title: String,
    pub voiced_by: String,
    pub kind: StoryKind,
    pub audio_source: PathBuf,
    pub image_source: Option<PathBuf>,
}

impl AddStoryRequest {
    pub fn new(audio_source: impl Into<PathBuf>) -> Self {
        Self {
            title: String::new(),
            voiced_by: String::new(),
            kind: StoryKind::Story,
            audio_source: audio_source.into(),
            image_source: None,
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

    pub fn with_image(mut self, image_source: impl Into<PathBuf>) -> Self {
        self.image_source = Some(image_source.into());
        self
    }
}

/// Library statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryStats {
    pub total_stories: usize,
    pub story_count: usize,
    pub song_count: usize,
    pub with_image: usize,
}

/// High-level story library
pub struct StoryLibrary {
    pool: DbPool,
    store: MediaStore,
    reconciler: Reconciler,
    config: LibraryConfig,
    listing: watch::Sender<Vec<Story>>,
}

impl StoryLibrary {
    /// Opens the library: connects, migrates, prepares the media store
    pub async fn new(config: LibraryConfig) -> Result<Self> {
        info!(
            "Opening story library: database {}, media {}",
            config.database_path,
            config.media_dir.display()
        );

        let pool = connect(DatabaseConfig::new(&config.database_path)).await?;
        run_migrations(&pool).await?;

        let store = MediaStore::open(&config.media_dir)?;
        let reconciler = Reconciler::new(pool.clone(), store.root());

        let initial = stories::list_stories(&pool).await?;
        let (listing, _) = watch::channel(initial);

        Ok(Self {
            pool,
            store,
            reconciler,
            config,
            listing,
        })
    }

    /// Adds a story, copying its media into the library first
    ///
    /// A failed thumbnail import downgrades to no-image rather than
    /// failing the whole add; a failed audio import is fatal to the
    /// request and leaves at most an orphan for the reconciler.
    pub async fn add_story(&self, request: AddStoryRequest) -> Result<Story> {
        let audio = self.store.import(&request.audio_source).await?;

        let image_path = match &request.image_source {
            Some(source) => match self.store.import(source).await {
                Ok(imported) => Some(imported.path),
                Err(e) => {
                    warn!("Dropping thumbnail for '{}': {}", request.title, e);
                    None
                }
            },
            None => None,
        };

        let mut draft = NewStory::new(audio.path)
            .with_title(request.title.trim())
            .with_voiced_by(request.voiced_by.trim())
            .with_kind(request.kind);
        if let Some(image) = image_path {
            draft = draft.with_image(image);
        }

        let story = stories::insert_story(&self.pool, &draft).await?;
        self.refresh_listing().await?;

        info!("Added story {} '{}'", story.id, story.title);
        Ok(story)
    }

    /// Gets a story by id
    pub async fn get_story(&self, id: StoryId) -> Result<Story> {
        stories::get_story(&self.pool, id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => LibraryError::StoryNotFound(id.to_string()),
                e => LibraryError::Database(e),
            })
    }

    /// Lists all stories
    ///
    /// With `reconcile_on_read` enabled the listing self-heals first, so
    /// callers never see a story whose audio has gone missing.
    pub async fn list_stories(&self) -> Result<Vec<Story>> {
        if self.config.reconcile_on_read {
            if let Err(e) = self.reconciler.reconcile().await {
                warn!("Opportunistic reconcile failed: {}", e);
            }
        }

        self.refresh_listing().await
    }

    /// Updates a story record
    pub async fn update_story(&self, story: &Story) -> Result<()> {
        stories::update_story(&self.pool, story).await?;
        self.refresh_listing().await?;
        Ok(())
    }

    /// Deletes a story and its media files
    ///
    /// The record goes first; file removal is best-effort and anything
    /// left behind is swept as an orphan later.
    pub async fn delete_story(&self, id: StoryId) -> Result<()> {
        let story = self.get_story(id).await?;

        stories::delete_story(&self.pool, id).await?;

        for path in std::iter::once(&story.audio_path).chain(story.image_path.iter()) {
            if let Err(e) = self.store.remove(path).await {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }

        self.refresh_listing().await?;
        info!("Deleted story {}", id);
        Ok(())
    }

    /// Subscribes to the continuously-updated listing
    ///
    /// The receiver always holds the most recent full listing; it is
    /// refreshed after every mutation and every reconcile pass issued
    /// through this library.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Story>> {
        self.listing.subscribe()
    }

    /// Runs an explicit reconcile pass
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let report = self.reconciler.reconcile().await?;
        self.refresh_listing().await?;
        Ok(report)
    }

    /// Builds the recurring cleanup job for this library
    pub fn cleanup_scheduler(&self) -> CleanupScheduler {
        CleanupScheduler::new(self.reconciler.clone())
    }

    /// Computes library statistics
    pub async fn stats(&self) -> Result<LibraryStats> {
        let stories = stories::list_stories(&self.pool).await?;

        Ok(LibraryStats {
            total_stories: stories.len(),
            story_count: stories
                .iter()
                .filter(|s| s.kind == StoryKind::Story)
                .count(),
            song_count: stories.iter().filter(|s| s.kind == StoryKind::Song).count(),
            with_image: stories.iter().filter(|s| s.has_image()).count(),
        })
    }

    /// Returns the media store
    pub fn media_store(&self) -> &MediaStore {
        &self.store
    }

    /// Returns the database pool for advanced operations
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn refresh_listing(&self) -> Result<Vec<Story>> {
        let stories = stories::list_stories(&self.pool).await?;
        self.listing.send_replace(stories.clone());
        Ok(stories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (StoryLibrary, TempDir) {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("library.db");
        let config = LibraryConfig::new(
            db_path.to_str().unwrap(),
            temp.path().join("media"),
        )
        .with_reconcile_on_read(false);
        let library = StoryLibrary::new(config).await.unwrap();
        (library, temp)
    }

    fn write_source(temp: &TempDir, name: &str) -> PathBuf {
        let path = temp.path().join(name);
        std::fs::write(&path, vec![1u8; 2048]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_library_starts_empty() {
        let (library, _temp) = setup().await;
        assert!(library.list_stories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_story_copies_media() {
        let (library, temp) = setup().await;
        let audio = write_source(&temp, "tale.mp4");

        let story = library
            .add_story(
                AddStoryRequest::new(&audio)
                    .with_title("  The Tale  ")
                    .with_voiced_by("Grandpa"),
            )
            .await
            .unwrap();

        // Title is trimmed, media lives inside the store
        assert_eq!(story.title, "The Tale");
        assert!(library.media_store().contains(&story.audio_path));
        assert!(story.audio_path.exists());
    }

    #[tokio::test]
    async fn test_add_story_missing_audio_fails() {
        let (library, temp) = setup().await;
        let missing = temp.path().join("nope.mp4");

        let result = library.add_story(AddStoryRequest::new(&missing)).await;
        assert!(matches!(result, Err(LibraryError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_story_bad_image_downgrades() {
        let (library, temp) = setup().await;
        let audio = write_source(&temp, "tale.mp4");

        let story = library
            .add_story(
                AddStoryRequest::new(&audio)
                    .with_title("Tale")
                    .with_image(temp.path().join("missing.jpeg")),
            )
            .await
            .unwrap();

        assert!(story.image_path.is_none());
    }

    #[tokio::test]
    async fn test_delete_story_removes_files() {
        let (library, temp) = setup().await;
        let audio = write_source(&temp, "tale.mp4");
        let image = write_source(&temp, "tale.jpeg");

        let story = library
            .add_story(AddStoryRequest::new(&audio).with_image(&image))
            .await
            .unwrap();
        let audio_path = story.audio_path.clone();
        let image_path = story.image_path.clone().unwrap();

        library.delete_story(story.id).await.unwrap();

        assert!(!audio_path.exists());
        assert!(!image_path.exists());
        assert!(library.get_story(story.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_story() {
        let (library, _temp) = setup().await;
        let result = library.delete_story(StoryId::from_i64(9)).await;
        assert!(matches!(result, Err(LibraryError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_subscribe_sees_mutations() {
        let (library, temp) = setup().await;
        let mut listing = library.subscribe();
        assert!(listing.borrow().is_empty());

        let audio = write_source(&temp, "tale.mp4");
        let story = library
            .add_story(AddStoryRequest::new(&audio).with_title("Tale"))
            .await
            .unwrap();

        listing.changed().await.unwrap();
        assert_eq!(listing.borrow().len(), 1);

        library.delete_story(story.id).await.unwrap();
        listing.changed().await.unwrap();
        assert!(listing.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let (library, temp) = setup().await;

        let a = write_source(&temp, "a.mp4");
        let b = write_source(&temp, "b.mp4");
        let img = write_source(&temp, "b.jpeg");

        library
            .add_story(AddStoryRequest::new(&a).with_kind(StoryKind::Story))
            .await
            .unwrap();
        library
            .add_story(
                AddStoryRequest::new(&b)
                    .with_kind(StoryKind::Song)
                    .with_image(&img),
            )
            .await
            .unwrap();

        let stats = library.stats().await.unwrap();
        assert_eq!(stats.total_stories, 2);
        assert_eq!(stats.story_count, 1);
        assert_eq!(stats.song_count, 1);
        assert_eq!(stats.with_image, 1);
    }

    #[tokio::test]
    async fn test_update_story() {
        let (library, temp) = setup().await;
        let audio = write_source(&temp, "a.mp4");

        let mut story = library
            .add_story(AddStoryRequest::new(&audio).with_title("Old"))
            .await
            .unwrap();
        story.title = "New".to_string();

        library.update_story(&story).await.unwrap();
        assert_eq!(library.get_story(story.id).await.unwrap().title, "New");
    }
}
