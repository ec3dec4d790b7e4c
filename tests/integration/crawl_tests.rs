//! Crawler-level tests: search acquisition, page extraction, discovery and
//! enrichment against mock servers.

use crate::common::{
    accept_probes, company_page, html, identity, results_page, test_config, RecordingLauncher,
    DEAD_URL,
};
use company_harvester::crawler::{CrawlFrontier, PageExtractor, RuleBook, TechStackClient};
use company_harvester::{
    Config, CrawlLedger, ExtractionLevel, IdentityManager, SearchAcquirer, UrlValidator,
};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor(config: &Config) -> PageExtractor {
    let rules = RuleBook::compile(&config.selectors);
    let enrichment = TechStackClient::new(&config.enrichment, &config.identity.user_agents)
        .expect("client should build");
    PageExtractor::new(rules, enrichment, config.pacing.clone())
}

fn acquirer(config: &Config) -> SearchAcquirer {
    SearchAcquirer::new(
        config.search.clone(),
        config.pacing.clone(),
        UrlValidator::plain(),
    )
}

#[tokio::test]
async fn test_search_collects_validated_urls_in_order() {
    let server = MockServer::start().await;
    let base = server.uri();
    accept_probes(&server).await;

    let first_page = vec![
        format!("{}/company-a", base),
        format!("{}/company-b", base),
        format!("{}/company-a", base),
    ];
    let second_page = vec![format!("{}/company-b", base), format!("{}/company-c", base)];

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rocket makers"))
        .and(query_param("first", "0"))
        .respond_with(html(results_page(&first_page)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("first", "10"))
        .respond_with(html(results_page(&second_page)))
        .mount(&server)
        .await;

    let config = test_config(&base);
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();

    let urls = acquirer(&config)
        .fetch_candidate_urls(&mut ledger, &mut identity, "rocket makers", 2, 2)
        .await;
    identity.shutdown().await;

    assert_eq!(
        urls,
        vec![
            format!("{}/company-a", base),
            format!("{}/company-b", base),
            format!("{}/company-c", base),
        ]
    );
    assert_eq!(ledger.error_count(), 0);
}

#[tokio::test]
async fn test_search_retries_empty_page_then_gives_up() {
    let server = MockServer::start().await;
    accept_probes(&server).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(results_page(&[])))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();

    let urls = acquirer(&config)
        .fetch_candidate_urls(&mut ledger, &mut identity, "nobody", 1, 2)
        .await;

    assert!(urls.is_empty());
    // Only the non-final attempt counts as a failure
    assert_eq!(ledger.error_count(), 1);
}

#[tokio::test]
async fn test_search_treats_challenge_page_as_failure() {
    let server = MockServer::start().await;
    accept_probes(&server).await;

    let challenge = format!(
        r#"<html><body><h1>Please complete the CAPTCHA</h1>{}</body></html>"#,
        results_page(&[format!("{}/company-a", server.uri())])
    );
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(challenge))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();

    let urls = acquirer(&config)
        .fetch_candidate_urls(&mut ledger, &mut identity, "rockets", 1, 2)
        .await;

    assert!(urls.is_empty());
    assert_eq!(ledger.error_count(), 2);
}

/// Configuration with one user agent and one proxy in the pools
fn rotating_config(base_url: &str) -> Config {
    let mut config = test_config(base_url);
    config.identity.user_agents = vec!["AgentA".to_string()];
    config.identity.proxies = vec!["http://10.0.0.1:3128".to_string()];
    config
}

#[tokio::test]
async fn test_failed_search_attempt_rotates_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(results_page(&[])))
        .expect(2)
        .mount(&server)
        .await;

    let config = rotating_config(&server.uri());
    let launcher = Arc::new(RecordingLauncher::default());
    let mut identity = IdentityManager::init(&config.identity, launcher.clone())
        .await
        .unwrap();
    let mut ledger = CrawlLedger::new();

    acquirer(&config)
        .fetch_candidate_urls(&mut ledger, &mut identity, "nobody", 1, 2)
        .await;

    // The first attempt fails, so the user agent is swapped and the session
    // relaunched behind a proxy; the final attempt rotates nothing
    assert_eq!(
        launcher.events(),
        vec![
            "launch 0 http://10.0.0.1:3128",
            "ua 0 AgentA",
            "close 0",
            "launch 1 http://10.0.0.1:3128",
        ]
    );
}

#[tokio::test]
async fn test_failed_page_load_relaunches_session() {
    let config = rotating_config("http://127.0.0.1:1");
    let extractor = extractor(&config);
    let launcher = Arc::new(RecordingLauncher::default());
    let mut identity = IdentityManager::init(&config.identity, launcher.clone())
        .await
        .unwrap();
    let mut ledger = CrawlLedger::new();

    extractor
        .scrape_page(&mut ledger, &mut identity, DEAD_URL, ExtractionLevel::Basic)
        .await;

    assert_eq!(ledger.error_count(), 1);
    assert_eq!(
        launcher.events(),
        vec![
            "launch 0 http://10.0.0.1:3128",
            "close 0",
            "launch 1 http://10.0.0.1:3128",
        ]
    );
}

#[tokio::test]
async fn test_same_url_is_scraped_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(company_page("Acme Rockets")))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let extractor = extractor(&config);
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();
    let url = format!("{}/acme", server.uri());

    assert!(
        extractor
            .scrape_page(&mut ledger, &mut identity, &url, ExtractionLevel::Medium)
            .await
    );
    assert!(
        !extractor
            .scrape_page(&mut ledger, &mut identity, &url, ExtractionLevel::Medium)
            .await
    );

    let records = ledger.records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert!(record.status.is_success());
    assert_eq!(record.name, "Acme Rockets");
    assert_eq!(record.website, "127.0.0.1");
    assert_eq!(record.email, "hello@acme.com");
    assert_eq!(record.phone, "123-456-7890");
    assert_eq!(record.address, "42 Launch Pad Way");
    assert_eq!(record.description, "Acme Rockets builds rockets");
    assert_eq!(record.social.linkedin, "https://www.linkedin.com/company/acme");
    assert_eq!(record.social.twitter, "https://twitter.com/acme");
    assert!(record.tech_stack.is_empty());
}

#[tokio::test]
async fn test_unreachable_page_yields_error_record() {
    let config = test_config("http://127.0.0.1:1");
    let extractor = extractor(&config);
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();

    extractor
        .scrape_page(&mut ledger, &mut identity, DEAD_URL, ExtractionLevel::Basic)
        .await;

    assert_eq!(ledger.error_count(), 1);
    assert_eq!(ledger.records().len(), 1);
    assert!(!ledger.records()[0].status.is_success());
    assert!(ledger.is_visited(DEAD_URL));
}

async fn mount_site(server: &MockServer) {
    let pages = [
        (
            "/",
            r#"<a href="/about">About</a> <a href="/team#top">Team</a>
               <a href="https://elsewhere.example/">Partner</a>
               <a href="mailto:hi@acme.com">Mail</a>"#,
        ),
        ("/about", r#"<h1>About</h1><a href="/about/history">History</a>"#),
        ("/team", r#"<h1>Team</h1><a href="/">Home</a>"#),
        ("/about/history", r#"<h1>History</h1>"#),
    ];

    for (route, body) in pages {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(format!("<html><body>{}</body></html>", body)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_discovery_respects_depth() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let config = test_config(&server.uri());
    let extractor = extractor(&config);
    let seed = format!("{}/", server.uri());

    for (depth, expected) in [(0, 0), (1, 2), (2, 3)] {
        let mut identity = identity(&config).await;
        let mut ledger = CrawlLedger::new();
        extractor
            .scrape_page(&mut ledger, &mut identity, &seed, ExtractionLevel::Basic)
            .await;

        let discovered = CrawlFrontier::new(None)
            .discover(&extractor, &mut ledger, &mut identity, &seed, depth)
            .await;

        assert_eq!(discovered, expected, "depth {}", depth);
        assert_eq!(ledger.records().len(), expected + 1);
        assert!(ledger
            .records()
            .iter()
            .all(|r| !r.url.contains("elsewhere.example")));
    }
}

#[tokio::test]
async fn test_discovery_page_cap() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let config = test_config(&server.uri());
    let extractor = extractor(&config);
    let seed = format!("{}/", server.uri());
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();
    ledger.claim(&seed);

    let discovered = CrawlFrontier::new(Some(1))
        .discover(&extractor, &mut ledger, &mut identity, &seed, 3)
        .await;

    assert_eq!(discovered, 1);
    assert_eq!(ledger.records().len(), 1);
    assert!(ledger.records()[0].url.ends_with("/about"));
}

#[tokio::test]
async fn test_enrichment_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v19/api.json"))
        .and(query_param("KEY", "secret"))
        .and(query_param("LOOKUP", "acme.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Results": [{
                "Result": {
                    "Paths": [
                        {"Technologies": [{"Name": "Nginx"}, {"Name": ""}]},
                        {"Technologies": [{"Name": "React"}]}
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v19/api.json"))
        .and(query_param("LOOKUP", "broken.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.enrichment.api_key = "secret".to_string();
    let client = TechStackClient::new(&config.enrichment, &[]).unwrap();

    assert!(client.is_enabled());
    assert_eq!(client.lookup("acme.com").await, "Nginx, React");
    assert_eq!(client.lookup("broken.com").await, "");
}

#[tokio::test]
async fn test_advanced_level_fills_tech_stack() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html(company_page("Acme Rockets")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v19/api.json"))
        .and(query_param("LOOKUP", "127.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Results": [{"Result": {"Paths": [{"Technologies": [{"Name": "Varnish"}]}]}}]
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.enrichment.api_key = "secret".to_string();
    let extractor = extractor(&config);
    let mut identity = identity(&config).await;
    let mut ledger = CrawlLedger::new();

    extractor
        .scrape_page(
            &mut ledger,
            &mut identity,
            &format!("{}/acme", server.uri()),
            ExtractionLevel::Advanced,
        )
        .await;

    assert_eq!(ledger.records()[0].tech_stack, "Varnish");
}
