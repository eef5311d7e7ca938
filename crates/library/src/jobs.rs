//! Recurring cleanup job
//!
//! One background job, named "cleanup", runs the reconciler on a fixed
//! interval. Scheduling uses a keep-existing policy: asking for the job
//! while it is already scheduled is a no-op, so an app restart never
//! stacks a second timer.

use crate::reconciler::Reconciler;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Identifier of the recurring cleanup job
pub const CLEANUP_JOB_NAME: &str = "cleanup";

/// Default period between cleanup passes
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Recurring scheduler for the reconciler
pub struct CleanupScheduler {
    reconciler: Reconciler,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CleanupScheduler {
    /// Creates a scheduler with the default daily interval
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            interval: DEFAULT_CLEANUP_INTERVAL,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Overrides the interval between passes
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Schedules the job; returns false if it was already scheduled
    pub fn schedule(&mut self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        info!(
            "Scheduling '{}' job every {:?}",
            CLEANUP_JOB_NAME, self.interval
        );

        let reconciler = self.reconciler.clone();
        let running = Arc::clone(&self.running);
        let period = self.interval;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick resolves immediately; periodic work starts
            // one full interval from now.
            ticker.tick().await;

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = reconciler.reconcile().await {
                    // The job survives a failed pass; the next tick retries
                    warn!("Cleanup pass failed: {}", e);
                }
            }
        }));

        true
    }

    /// Cancels the job if scheduled
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping '{}' job", CLEANUP_JOB_NAME);

        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Returns true while the job is scheduled
    pub fn is_scheduled(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
