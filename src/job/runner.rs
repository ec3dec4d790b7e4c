//! Background job execution with single-job exclusivity

use crate::job::{JobContext, JobOrchestrator, JobSpec};
use crate::state::JobStatus;
use crate::HarvestError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Clears the active flag when the job task ends, panics included
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Starts jobs on a tokio task, rejecting a start while one is active
#[derive(Clone)]
pub struct JobRunner {
    orchestrator: Arc<JobOrchestrator>,
    active: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(orchestrator: JobOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    pub fn context(&self) -> &JobContext {
        self.orchestrator.context()
    }

    /// Returns true while a job task is alive
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Snapshot of the current job status
    pub fn status(&self) -> JobStatus {
        self.context().snapshot()
    }

    /// Starts `spec` in the background
    ///
    /// The status switches to `running` before this returns, so readers never
    /// see the previous job's terminal state after a successful start.
    ///
    /// # Returns
    ///
    /// * `Ok(JoinHandle)` - Resolves to the final status
    /// * `Err(HarvestError::JobAlreadyRunning)` - Another job is active; its
    ///   status is left untouched
    pub fn start(&self, spec: JobSpec) -> crate::Result<JoinHandle<JobStatus>> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Start rejected: a job is already running");
            return Err(HarvestError::JobAlreadyRunning);
        }

        let guard = ActiveGuard(Arc::clone(&self.active));
        self.orchestrator.context().begin();
        tracing::info!("Job started");

        let orchestrator = Arc::clone(&self.orchestrator);
        let context = self.orchestrator.context().clone();
        Ok(tokio::spawn(async move {
            let _guard = guard;
            let worker = tokio::spawn(async move { orchestrator.drive(spec).await });

            match worker.await {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!("Job task aborted: {}", e);
                    context.fail(format!("Job aborted: {}", e));
                    context.snapshot()
                }
            }
        }))
    }
}
