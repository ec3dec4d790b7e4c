//! Shared job status
//!
//! The worker is the only writer. Readers get clones, so a snapshot never
//! holds the lock and may lag the worker by a few updates.

use crate::state::JobStatus;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Handle to the status of the current (or last) job
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    status: Arc<RwLock<JobStatus>>,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current status
    pub fn snapshot(&self) -> JobStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the status with a fresh running one
    pub fn begin(&self) {
        *self.write() = JobStatus::started();
    }

    pub fn set_total(&self, total_urls: usize) {
        let mut status = self.write();
        let (scraped, errors) = (status.urls_scraped, status.error_count);
        status.record_progress(scraped, total_urls, errors);
    }

    pub fn record_progress(&self, urls_scraped: usize, total_urls: usize, error_count: usize) {
        self.write()
            .record_progress(urls_scraped, total_urls, error_count);
    }

    /// Marks the job completed; an illegal transition is logged and ignored
    pub fn complete(&self, output_path: Option<PathBuf>, message: impl Into<String>) {
        if let Err(e) = self.write().complete(output_path, message) {
            tracing::error!("Could not complete job: {}", e);
        }
    }

    /// Marks the job failed; an illegal transition is logged and ignored
    pub fn fail(&self, message: impl Into<String>) {
        if let Err(e) = self.write().fail(message) {
            tracing::error!("Could not mark job failed: {}", e);
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, JobStatus> {
        self.status.write().unwrap_or_else(PoisonError::into_inner)
    }
}
