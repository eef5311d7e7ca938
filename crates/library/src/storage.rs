//! Private media-file storage
//!
//! All audio and image files a story references live in one app-private
//! directory, named by random identifiers with the source extension
//! preserved. Externally picked content is copied in before a record may
//! reference it, so the store only ever owns what the database points at.
//! A `captures` subdirectory holds transient recorder/camera output until
//! it is re-encoded or imported.

use crate::error::{LibraryError, Result};
use log::debug;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufReader};
use uuid::Uuid;

const COPY_CHUNK_SIZE: usize = 4 * 1024;

const CAPTURES_DIR: &str = "captures";

/// A file that has been copied into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    /// Location inside the media directory
    pub path: PathBuf,
    /// Display name of the source file, for UI purposes
    pub display_name: String,
}

/// App-private media directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Opens the store, creating the directory layout if missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(root.join(CAPTURES_DIR))?;
        Ok(Self { root })
    }

    /// Returns the media directory root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the transient captures directory
    pub fn captures_dir(&self) -> PathBuf {
        self.root.join(CAPTURES_DIR)
    }

    /// Returns true if the path lies inside the media directory
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Reserves a fresh randomly-named location in the media directory
    pub fn allocate(&self, extension: Option<&str>) -> PathBuf {
        self.root.join(random_name(extension))
    }

    /// Reserves a fresh randomly-named location for recorder/camera output
    pub fn allocate_capture(&self, extension: Option<&str>) -> PathBuf {
        self.captures_dir().join(random_name(extension))
    }

    /// Copies an external file into the store
    ///
    /// The copy is chunked so large recordings never sit in memory whole.
    /// A copy interrupted partway leaves an orphan for the reconciler.
    pub async fn import(&self, source: &Path) -> Result<ImportedFile> {
        if !source.is_file() {
            return Err(LibraryError::SourceNotFound(source.to_path_buf()));
        }

        let display_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LibraryError::InvalidFile(format!("{}", source.display())))?
            .to_string();

        let destination = self.allocate(source.extension().and_then(|e| e.to_str()));

        let input = tokio::fs::File::open(source).await?;
        let mut reader = BufReader::with_capacity(COPY_CHUNK_SIZE, input);
        let mut output = tokio::fs::File::create(&destination).await?;
        tokio::io::copy_buf(&mut reader, &mut output).await?;
        output.flush().await?;

        debug!("Imported {} as {}", source.display(), destination.display());

        Ok(ImportedFile {
            path: destination,
            display_name,
        })
    }

    /// Removes a file from the store
    pub async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

fn random_name(extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
        _ => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> MediaStore {
        MediaStore::open(dir.path().join("media")).unwrap()
    }

    #[test]
    fn test_open_creates_layout() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.root().is_dir());
        assert!(store.captures_dir().is_dir());
    }

    #[test]
    fn test_allocate_preserves_extension() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let path = store.allocate(Some("mp4"));
        assert_eq!(path.extension().unwrap(), "mp4");
        assert!(store.contains(&path));

        let bare = store.allocate(None);
        assert!(bare.extension().is_none());
    }

    #[test]
    fn test_allocate_is_unique() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert_ne!(store.allocate(Some("jpeg")), store.allocate(Some("jpeg")));
    }

    #[test]
    fn test_allocate_capture_lands_in_captures() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let path = store.allocate_capture(Some("mp4"));
        assert!(path.starts_with(store.captures_dir()));
    }

    #[test]
    fn test_contains() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.contains(&store.allocate(Some("mp4"))));
        assert!(!store.contains(Path::new("/elsewhere/file.mp4")));
    }

    #[tokio::test]
    async fn test_import_copies_content() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let source = temp.path().join("bedtime song.mp4");
        fs::write(&source, vec![7u8; 10_000]).unwrap();

        let imported = store.import(&source).await.unwrap();

        assert!(store.contains(&imported.path));
        assert_eq!(imported.display_name, "bedtime song.mp4");
        assert_eq!(imported.path.extension().unwrap(), "mp4");
        assert_eq!(fs::read(&imported.path).unwrap(), vec![7u8; 10_000]);
        // Source stays put; the caller owns it
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_import_missing_source() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let result = store.import(Path::new("/nonexistent/file.mp4")).await;
        assert!(matches!(result, Err(LibraryError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let source = temp.path().join("a.mp4");
        fs::write(&source, b"audio").unwrap();
        let imported = store.import(&source).await.unwrap();

        store.remove(&imported.path).await.unwrap();
        assert!(!imported.path.exists());
    }
}
