//! HTTP control surface
//!
//! Lets a dashboard start a query job, poll its status and preview results
//! while the worker runs on its own task.
//!
//! Routes:
//! - `GET /status` - job status snapshot
//! - `GET /results` - first records of the last JSON export
//! - `POST /start` - start a query job
//! - `GET /health` - liveness
//! - `POST /run` - run the job given on the command line (only when served
//!   with one, see [`router_with_cli_job`])

mod routes;

pub use routes::{MessageResponse, StartRequest, RESULTS_PREVIEW_LIMIT};

use crate::job::{JobRunner, JobSpec};
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

/// Builds the control-surface router around a job runner
pub fn router(runner: JobRunner) -> Router {
    Router::new()
        .route("/status", get(routes::status))
        .route("/results", get(routes::results))
        .route("/start", post(routes::start))
        .route("/health", get(routes::health))
        .with_state(runner)
}

/// Same as [`router`] plus `/run`, which runs `cli_job` to completion
pub fn router_with_cli_job(runner: JobRunner, cli_job: JobSpec) -> Router {
    let run = Router::new()
        .route(
            "/run",
            get(routes::run_hint).post(move |state: State<JobRunner>| {
                routes::run(state, cli_job.clone())
            }),
        )
        .with_state(runner.clone());

    router(runner).merge(run)
}

/// Serves the control surface until the process ends
///
/// When `cli_job` is set, `POST /run` starts it.
pub async fn serve(
    host: &str,
    port: u16,
    runner: JobRunner,
    cli_job: Option<JobSpec>,
) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Control surface listening on http://{}", listener.local_addr()?);

    let app = match cli_job {
        Some(spec) => router_with_cli_job(runner, spec),
        None => router(runner),
    };
    axum::serve(listener, app).await?;
    Ok(())
}
