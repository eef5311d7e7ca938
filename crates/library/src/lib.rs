//! Story library management
//!
//! This crate owns everything between the database and the filesystem:
//! the app-private media store, the file lifecycle reconciler, the
//! recurring cleanup job, and the [`StoryLibrary`] facade that ties
//! them together behind an observable listing.

pub mod error;
pub mod jobs;
pub mod manager;
pub mod reconciler;
pub mod storage;

pub use error::{LibraryError, Result};
pub use jobs::{CleanupScheduler, CLEANUP_JOB_NAME, DEFAULT_CLEANUP_INTERVAL};
pub use manager::{AddStoryRequest, LibraryConfig, LibraryStats, StoryLibrary};
pub use reconciler::{ReconcileReport, Reconciler};
pub use storage::{ImportedFile, MediaStore};
