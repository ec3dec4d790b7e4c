//! Control-surface tests driven through the router without a socket

use crate::common::{accept_probes, company_page, html, orchestrator, test_config};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use company_harvester::server::{router, router_with_cli_job, MessageResponse};
use company_harvester::{JobRunner, JobSpec, JobState, OutputFormat};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn message(body: Value) -> MessageResponse {
    serde_json::from_value(body).unwrap()
}

fn idle_runner() -> JobRunner {
    JobRunner::new(orchestrator(test_config("http://127.0.0.1:1")))
}

async fn wait_until_idle(runner: &JobRunner) {
    for _ in 0..250 {
        if !runner.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job did not finish in time");
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call(router(idle_runner()), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["job_running"], false);
    assert!(body["timestamp"].is_string());
    assert!(body["system"]["os"].is_string());
}

#[tokio::test]
async fn test_status_before_any_job() {
    let (status, body) = call(router(idle_runner()), get("/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["urls_scraped"], 0);
    assert!(body["output_path"].is_null());
}

#[tokio::test]
async fn test_results_empty_without_export() {
    let (status, body) = call(router(idle_runner()), get("/results")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_start_rejects_bad_requests() {
    let runner = idle_runner();

    let no_body = Request::builder()
        .method("POST")
        .uri("/start")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(router(runner.clone()), no_body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(body).status, "error");

    let (status, body) = call(router(runner.clone()), post_json("/start", r#"{"query": "  "}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(body).message, "Missing query");

    assert!(!runner.is_running());
    assert_eq!(runner.status().state, JobState::Idle);
}

#[tokio::test]
async fn test_start_runs_query_job() {
    let server = MockServer::start().await;
    // The results container never renders, so the job ends without export
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let (status, body) = call(
        router(runner.clone()),
        post_json("/start", r#"{"query": "rocket makers", "level": "medium", "pages": 1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        message(body),
        MessageResponse {
            status: "success".to_string(),
            message: "Job started".to_string(),
        }
    );

    wait_until_idle(&runner).await;
    let (_, body) = call(router(runner.clone()), get("/status")).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "No search results found");
}

#[tokio::test]
async fn test_start_conflicts_while_running() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(company_page("Slow Co")).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let handle = runner
        .start(
            JobSpec::seeds([format!("{}/slow", server.uri())]).with_output(
                OutputFormat::Json,
                dir.path().join("companies").to_string_lossy(),
            ),
        )
        .unwrap();

    let (status, body) = call(router(runner.clone()), post_json("/start", r#"{"query": "x"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(message(body).message, "Job already running");
    assert_eq!(runner.status().state, JobState::Running);

    handle.await.unwrap();
}

#[tokio::test]
async fn test_results_preview_after_json_export() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .respond_with(html(company_page("Acme Rockets")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let urls: Vec<String> = (0..12).map(|i| format!("{}/company-{}", server.uri(), i)).collect();

    let finished = runner
        .start(JobSpec::seeds(urls).with_output(
            OutputFormat::Json,
            dir.path().join("companies").to_string_lossy(),
        ))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(finished.state, JobState::Completed);

    let (status, body) = call(router(runner), get("/results")).await;
    assert_eq!(status, StatusCode::OK);

    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["name"], "Acme Rockets");
    assert_eq!(records[0]["status"], "success");
}

#[tokio::test]
async fn test_start_accepts_page_count_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let (status, body) = call(
        router(runner.clone()),
        post_json("/start", r#"{"query": "rocket makers", "pages": "2"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(body).message, "Job started");
    wait_until_idle(&runner).await;

    let (status, _) = call(
        router(runner.clone()),
        post_json("/start", r#"{"query": "rocket makers", "pages": "many"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_run_executes_command_line_job() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(company_page("Acme Rockets")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let cli_job = JobSpec::seeds([format!("{}/acme", server.uri())]).with_output(
        OutputFormat::Json,
        dir.path().join("companies").to_string_lossy(),
    );
    let app = router_with_cli_job(runner.clone(), cli_job);

    let (status, body) = call(app.clone(), get("/run")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(body).message, "Use POST method");

    let (status, body) = call(app.clone(), post_json("/run", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        message(body),
        MessageResponse {
            status: "success".to_string(),
            message: "Scraped 1 companies".to_string(),
        }
    );
    assert_eq!(runner.status().state, JobState::Completed);
    assert!(!runner.is_running());

    // The other routes stay mounted
    let (_, body) = call(app, get("/results")).await;
    assert_eq!(body[0]["name"], "Acme Rockets");
}

#[tokio::test]
async fn test_run_reports_failed_job() {
    let runner = idle_runner();
    let app = router_with_cli_job(runner.clone(), JobSpec::default());

    let (status, body) = call(app, post_json("/run", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(body).status, "error");
    assert_eq!(runner.status().state, JobState::Failed);
}

#[tokio::test]
async fn test_plain_router_has_no_run_route() {
    let (status, _) = call(router(idle_runner()), post_json("/run", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
