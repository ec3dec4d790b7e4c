//! Control-surface handlers

use crate::crawler::ExtractionLevel;
use crate::job::{JobRunner, JobSpec, DEFAULT_OUTPUT_NAME, DEFAULT_SEARCH_PAGES};
use crate::output::{load_json_records, OutputFormat};
use crate::state::{ExtractionRecord, JobState, JobStatus};
use crate::HarvestError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Maximum number of records returned by `/results`
pub const RESULTS_PREVIEW_LIMIT: usize = 10;

/// Body of `POST /start`
#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub level: Option<ExtractionLevel>,
    /// Accepts a number or a numeric string
    #[serde(default, deserialize_with = "page_count")]
    pub pages: Option<u32>,
}

fn page_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PageCount {
        Number(u32),
        Text(String),
    }

    match Option::<PageCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PageCount::Number(pages)) => Ok(Some(pages)),
        Some(PageCount::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid page count: {:?}", text))),
    }
}

/// `{"status": ..., "message": ...}` reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    fn success(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: message.to_string(),
        }
    }
}

pub(crate) async fn status(State(runner): State<JobRunner>) -> Json<JobStatus> {
    Json(runner.status())
}

pub(crate) async fn results(State(runner): State<JobRunner>) -> Json<Vec<ExtractionRecord>> {
    let Some(path) = runner
        .status()
        .output_path
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
    else {
        return Json(Vec::new());
    };

    match tokio::task::spawn_blocking(move || load_json_records(&path)).await {
        Ok(Ok(mut records)) => {
            records.truncate(RESULTS_PREVIEW_LIMIT);
            Json(records)
        }
        Ok(Err(e)) => {
            tracing::warn!("Could not read results: {}", e);
            Json(Vec::new())
        }
        Err(e) => {
            tracing::error!("Results reader panicked: {}", e);
            Json(Vec::new())
        }
    }
}

pub(crate) async fn start(
    State(runner): State<JobRunner>,
    payload: Option<Json<StartRequest>>,
) -> (StatusCode, Json<MessageResponse>) {
    let already_running = || {
        (
            StatusCode::CONFLICT,
            Json(MessageResponse::error("Job already running")),
        )
    };

    if runner.is_running() {
        return already_running();
    }

    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::error("Invalid request")),
        );
    };

    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::error("Missing query")),
        );
    }

    let spec = JobSpec::query(
        request.query.trim(),
        request.pages.unwrap_or(DEFAULT_SEARCH_PAGES),
    )
    .with_level(request.level.unwrap_or_default())
    .with_output(OutputFormat::Json, DEFAULT_OUTPUT_NAME);

    match runner.start(spec) {
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::success("Job started")),
        ),
        Err(HarvestError::JobAlreadyRunning) => already_running(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::error(&e.to_string())),
        ),
    }
}

/// Runs the job given on the command line and answers when it ends
pub(crate) async fn run(
    State(runner): State<JobRunner>,
    spec: JobSpec,
) -> (StatusCode, Json<MessageResponse>) {
    let handle = match runner.start(spec) {
        Ok(handle) => handle,
        Err(HarvestError::JobAlreadyRunning) => {
            return (
                StatusCode::CONFLICT,
                Json(MessageResponse::error("Job already running")),
            )
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::error(&e.to_string())),
            )
        }
    };

    match handle.await {
        Ok(status) if status.state == JobState::Completed => {
            (StatusCode::OK, Json(MessageResponse::success(&status.message)))
        }
        Ok(status) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::error(&status.message)),
        ),
        Err(e) => {
            tracing::error!("Job task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::error(&e.to_string())),
            )
        }
    }
}

pub(crate) async fn run_hint() -> Json<MessageResponse> {
    Json(MessageResponse::error("Use POST method"))
}

pub(crate) async fn health(State(runner): State<JobRunner>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "job_running": runner.is_running(),
        "system": {
            "version": env!("CARGO_PKG_VERSION"),
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    }))
}
