//! Job status snapshot
//!
//! The status is written by the job worker only. Readers take clones through
//! [`JobContext`](crate::job::JobContext) and may see a status that is a few
//! updates behind.

use crate::state::JobState;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Progress and outcome of the current (or last) job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "status")]
    pub state: JobState,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub urls_scraped: usize,
    pub total_urls: usize,
    pub error_count: usize,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

impl JobStatus {
    /// A fresh status for a job that starts now
    pub fn started() -> Self {
        Self {
            state: JobState::Running,
            start_time: Some(Utc::now()),
            message: "Starting job".to_string(),
            ..Self::default()
        }
    }

    /// Records progress after a top-level URL; counters never go backwards
    pub fn record_progress(&mut self, urls_scraped: usize, total_urls: usize, error_count: usize) {
        self.urls_scraped = self.urls_scraped.max(urls_scraped);
        self.total_urls = self.total_urls.max(total_urls);
        self.error_count = self.error_count.max(error_count);
    }

    /// Moves a running job to `completed`
    pub fn complete(
        &mut self,
        output_path: Option<PathBuf>,
        message: impl Into<String>,
    ) -> crate::Result<()> {
        self.transition(JobState::Completed)?;
        self.output_path = output_path;
        self.message = message.into();
        Ok(())
    }

    /// Moves a running job to `failed`
    pub fn fail(&mut self, message: impl Into<String>) -> crate::Result<()> {
        self.transition(JobState::Failed)?;
        self.message = message.into();
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> crate::Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        if next.is_terminal() {
            self.end_time = Some(Utc::now());
        }
        Ok(())
    }
}
