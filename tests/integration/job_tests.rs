//! Job-level tests: orchestration, export and single-job exclusivity

use crate::common::{
    accept_probes, company_page, html, orchestrator, results_page, test_config, DEAD_URL,
};
use company_harvester::output::load_json_records;
use company_harvester::{
    ExtractionLevel, HarvestError, JobRunner, JobSpec, JobState, OutputFormat,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn output_base(dir: &TempDir) -> String {
    dir.path().join("companies").to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_seed_job_exports_json() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(company_page("Acme Rockets")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let acme = format!("{}/acme", server.uri());
    let spec = JobSpec::seeds([acme.clone(), DEAD_URL.to_string()])
        .with_level(ExtractionLevel::Medium)
        .with_output(OutputFormat::Json, output_base(&dir));

    let status = orchestrator(test_config(&server.uri())).run(spec).await;

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.message, "Scraped 1 companies");
    assert_eq!(status.urls_scraped, 2);
    assert_eq!(status.total_urls, 2);
    assert_eq!(status.error_count, 1);
    assert!(status.end_time.is_some());

    let output = status.output_path.expect("export path");
    assert_eq!(output.extension().unwrap(), "json");

    let records = load_json_records(&output).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, acme);
    assert!(records[0].status.is_success());
    assert_eq!(records[0].email, "hello@acme.com");
}

#[tokio::test]
async fn test_query_job_exports_csv() {
    let server = MockServer::start().await;
    accept_probes(&server).await;

    let acme = format!("{}/acme", server.uri());
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(results_page(&[acme.clone()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(company_page("Acme Rockets")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let spec = JobSpec::query("rocket makers", 1).with_output(OutputFormat::Csv, output_base(&dir));

    let status = orchestrator(test_config(&server.uri())).run(spec).await;

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.total_urls, 1);

    let output = status.output_path.expect("export path");
    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "url");
    assert_eq!(&headers[12], "status");

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], acme);
    assert_eq!(&rows[0][1], "Acme Rockets");
    assert_eq!(&rows[0][12], "success");
}

#[tokio::test]
async fn test_job_without_input_fails() {
    let status = orchestrator(test_config("http://127.0.0.1:1"))
        .run(JobSpec::default())
        .await;

    assert_eq!(status.state, JobState::Failed);
    assert_eq!(status.message, HarvestError::NoInput.to_string());
    assert!(status.output_path.is_none());
}

#[tokio::test]
async fn test_query_without_results_fails_without_export() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(results_page(&[])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let spec = JobSpec::query("nobody", 1).with_output(OutputFormat::Json, output_base(&dir));

    let status = orchestrator(test_config(&server.uri())).run(spec).await;

    assert_eq!(status.state, JobState::Failed);
    assert_eq!(status.message, HarvestError::NoSearchResults.to_string());
    assert!(status.output_path.is_none());
    assert!(!dir.path().join("companies.json").exists());
}

#[tokio::test]
async fn test_selector_override_replaces_defaults() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(
            "<html><body><h1>Welcome</h1><h2>Acme Rockets Ltd</h2></body></html>".to_string(),
        ))
        .mount(&server)
        .await;

    let mut overrides = BTreeMap::new();
    overrides.insert("company_name".to_string(), vec!["h2".to_string()]);

    let dir = TempDir::new().unwrap();
    let spec = JobSpec::seeds([format!("{}/acme", server.uri())])
        .with_selector_overrides(overrides)
        .with_output(OutputFormat::Json, output_base(&dir));

    let status = orchestrator(test_config(&server.uri())).run(spec).await;
    let records = load_json_records(&status.output_path.expect("export path")).unwrap();

    assert_eq!(records[0].name, "Acme Rockets Ltd");
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html(company_page("Slow Co")).set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));

    let handle = runner
        .start(
            JobSpec::seeds([format!("{}/slow", server.uri())])
                .with_output(OutputFormat::Json, output_base(&dir)),
        )
        .unwrap();

    assert!(runner.is_running());
    let before = runner.status();
    assert_eq!(before.state, JobState::Running);

    let second = runner.start(JobSpec::query("other", 1));
    assert!(matches!(second, Err(HarvestError::JobAlreadyRunning)));

    let during = runner.status();
    assert_eq!(during.state, JobState::Running);
    assert_eq!(during.start_time, before.start_time);

    let finished = handle.await.unwrap();
    assert_eq!(finished.state, JobState::Completed);
    assert_eq!(runner.status().state, JobState::Completed);

    // A finished job frees the runner for the next one
    let next = runner.start(JobSpec::default()).unwrap();
    assert_eq!(next.await.unwrap().state, JobState::Failed);
}

#[tokio::test]
async fn test_progress_is_published_while_running() {
    let server = MockServer::start().await;
    accept_probes(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let runner = JobRunner::new(orchestrator(test_config(&server.uri())));
    let urls: Vec<String> = (0..3).map(|i| format!("{}/page-{}", server.uri(), i)).collect();

    let handle = runner
        .start(JobSpec::seeds(urls).with_output(OutputFormat::Json, output_base(&dir)))
        .unwrap();

    // Wait for the worker to publish its total
    let mut early = runner.status();
    for _ in 0..200 {
        if early.total_urls > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        early = runner.status();
    }
    assert_eq!(early.total_urls, 3);
    assert!(early.urls_scraped <= 3);

    let finished = handle.await.unwrap();
    assert_eq!(finished.urls_scraped, 3);
    assert!(finished.urls_scraped >= early.urls_scraped);
}
