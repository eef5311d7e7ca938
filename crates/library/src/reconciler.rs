//! File lifecycle reconciliation
//!
//! Keeps the story table and the media directory consistent with each
//! other: orphaned files are deleted, stories whose audio is gone are
//! purged, and dangling thumbnail references are cleared. Every failure
//! is per-file and non-fatal; whatever a pass could not fix is left for
//! the next one.

use crate::error::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use storynook_database::queries::stories::{clear_image_paths, delete_stories, list_stories};
use storynook_database::DbPool;
use walkdir::WalkDir;

/// Outcome of a single reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Unreferenced files deleted from the media directory
    pub orphans_removed: usize,
    /// Stories purged because their audio file was missing
    pub stories_removed: usize,
    /// Stories whose dangling image reference was cleared
    pub images_cleared: usize,
}

impl ReconcileReport {
    /// Returns true if the pass found nothing to repair
    pub fn is_clean(&self) -> bool {
        self.orphans_removed == 0 && self.stories_removed == 0 && self.images_cleared == 0
    }
}

/// Consistency-repair pass between the story table and the filesystem
#[derive(Debug, Clone)]
pub struct Reconciler {
    pool: DbPool,
    media_root: PathBuf,
}

impl Reconciler {
    pub fn new(pool: DbPool, media_root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            media_root: media_root.into(),
        }
    }

    /// Runs one reconcile pass
    ///
    /// The referenced-file snapshot is taken before the orphan sweep, and
    /// the sweep skips files modified after the pass started, so an
    /// import completing mid-sweep never loses its freshly written file.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let sweep_started = SystemTime::now();
        let stories = list_stories(&self.pool).await?;

        let referenced: HashSet<PathBuf> = stories
            .iter()
            .flat_map(|story| {
                std::iter::once(&story.audio_path).chain(story.image_path.iter())
            })
            .map(|path| normalize(path))
            .collect();

        let orphans_removed = self.sweep_orphans(&referenced, sweep_started);

        let missing_audio: Vec<_> = stories
            .iter()
            .filter(|story| !story.audio_path.exists())
            .map(|story| story.id)
            .collect();
        let stories_removed = delete_stories(&self.pool, &missing_audio).await? as usize;

        let missing_images: Vec<_> = stories
            .iter()
            .filter(|story| !missing_audio.contains(&story.id))
            .filter(|story| matches!(&story.image_path, Some(image) if !image.exists()))
            .map(|story| story.id)
            .collect();
        let images_cleared = clear_image_paths(&self.pool, &missing_images).await? as usize;

        let report = ReconcileReport {
            orphans_removed,
            stories_removed,
            images_cleared,
        };

        if report.is_clean() {
            debug!("Reconcile pass found nothing to repair");
        } else {
            info!(
                "Reconcile pass: {} orphans removed, {} stories purged, {} images cleared",
                report.orphans_removed, report.stories_removed, report.images_cleared
            );
        }

        Ok(report)
    }

    /// Deletes unreferenced files under the media directory
    fn sweep_orphans(&self, referenced: &HashSet<PathBuf>, sweep_started: SystemTime) -> usize {
        let mut removed = 0;

        for entry in WalkDir::new(&self.media_root) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking media directory: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if referenced.contains(&normalize(path)) {
                continue;
            }

            // A file written while the sweep runs may belong to an import
            // that has not reached the database yet. Leave it alone; if it
            // really is an orphan, the next pass gets it.
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
            if !matches!(modified, Some(time) if time < sweep_started) {
                debug!("Skipping in-flight file: {}", path.display());
                continue;
            }

            match std::fs::remove_file(path) {
                Ok(()) => {
                    debug!("Removed orphan file: {}", path.display());
                    removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove orphan {}: {}", path.display(), e);
                }
            }
        }

        removed
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default_is_clean() {
        assert!(ReconcileReport::default().is_clean());
    }

    #[test]
    fn test_report_with_work_is_not_clean() {
        let report = ReconcileReport {
            orphans_removed: 1,
            ..Default::default()
        };
        assert!(!report.is_clean());
    }
}
