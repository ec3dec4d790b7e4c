/// Job state definitions
///
/// A job moves `idle -> running -> {completed | failed}`. Terminal states are
/// final; a new run starts from a fresh [`JobStatus`](crate::state::JobStatus).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the lifecycle state of the harvesting job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// No job has been started
    #[default]
    Idle,

    /// The worker is acquiring or extracting
    Running,

    // ===== Terminal States =====
    /// The job finished and its output was written
    Completed,

    /// The job stopped on an unhandled job-level error
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// String form used in status documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> [Self; 4] {
        [Self::Idle, Self::Running, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
