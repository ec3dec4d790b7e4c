//! Shared fixtures for the integration tests

use async_trait::async_trait;
use company_harvester::config::{Config, PacingConfig};
use company_harvester::identity::{BrowserSession, HttpLauncher, IdentityManager, SessionLauncher};
use company_harvester::{IdentityProfile, JobContext, JobOrchestrator, SessionResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An address nothing listens on
pub const DEAD_URL: &str = "http://127.0.0.1:1/unreachable";

/// Configuration pointing every collaborator at the mock server
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config {
        pacing: PacingConfig::immediate(),
        ..Config::default()
    };

    config.search.engine_url = format!("{}/search", base_url);
    config.search.max_retries = 2;
    config.enrichment.endpoint = format!("{}/v19/api.json", base_url);

    config.selectors = default_selectors();
    config
}

pub fn default_selectors() -> BTreeMap<String, Vec<String>> {
    let mut selectors = BTreeMap::new();
    selectors.insert("company_name".to_string(), vec!["h1".to_string()]);
    selectors.insert(
        "description".to_string(),
        vec!["meta[name='description']".to_string()],
    );
    selectors.insert("address".to_string(), vec!["address".to_string()]);
    selectors.insert("social".to_string(), vec!["//a/@href".to_string()]);
    selectors
}

pub fn launcher() -> Arc<dyn SessionLauncher> {
    Arc::new(HttpLauncher::new(Duration::from_secs(5)))
}

pub fn orchestrator(config: Config) -> JobOrchestrator {
    JobOrchestrator::new(Arc::new(config), launcher(), JobContext::new())
}

pub async fn identity(config: &Config) -> IdentityManager {
    IdentityManager::init(&config.identity, launcher())
        .await
        .expect("HTTP session should launch")
}

/// Launches direct HTTP sessions and logs every identity change
///
/// Events read `launch <n> <proxy>`, `ua <n> <agent>` and `close <n>`, where
/// `n` numbers sessions in launch order. The requested proxy is only
/// recorded, so sessions still reach the mock server.
#[derive(Default)]
pub struct RecordingLauncher {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingLauncher {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionLauncher for RecordingLauncher {
    async fn launch(&self, profile: &IdentityProfile) -> SessionResult<Box<dyn BrowserSession>> {
        let direct = IdentityProfile {
            user_agent: profile.user_agent.clone(),
            proxy: None,
        };
        let inner = HttpLauncher::new(Duration::from_secs(5)).launch(&direct).await?;

        let mut events = self.events.lock().unwrap();
        let id = events.iter().filter(|e| e.starts_with("launch")).count();
        events.push(format!(
            "launch {} {}",
            id,
            profile.proxy.as_deref().unwrap_or("none")
        ));

        Ok(Box::new(RecordingSession {
            id,
            inner,
            events: Arc::clone(&self.events),
        }))
    }
}

struct RecordingSession {
    id: usize,
    inner: Box<dyn BrowserSession>,
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingSession {
    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl BrowserSession for RecordingSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.inner.navigate(url).await
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<()> {
        self.inner.wait_for(selector, timeout).await
    }

    async fn page_source(&mut self) -> SessionResult<String> {
        self.inner.page_source().await
    }

    async fn override_user_agent(&mut self, user_agent: &str) -> SessionResult<()> {
        self.record(format!("ua {} {}", self.id, user_agent));
        self.inner.override_user_agent(user_agent).await
    }

    async fn move_pointer(&mut self, dx: i32, dy: i32) -> SessionResult<()> {
        self.inner.move_pointer(dx, dy).await
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        self.inner.scroll_to_bottom().await
    }

    async fn close(self: Box<Self>) -> SessionResult<()> {
        self.record(format!("close {}", self.id));
        self.inner.close().await
    }
}

/// Answers every HEAD probe with 200
pub async fn accept_probes(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// A company page with contacts, an address and social links
pub fn company_page(name: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title>
        <meta name="description" content="{name} builds rockets"></head>
        <body>
          <h1>{name}</h1>
          <p>Write to hello@acme.com or call 123-456-7890.</p>
          <address>42 Launch Pad Way</address>
          <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
          <a href="https://twitter.com/acme">Twitter</a>
        </body></html>"#
    )
}

/// A search results page listing `links`
pub fn results_page(links: &[String]) -> String {
    let items: String = links
        .iter()
        .map(|href| {
            format!(
                r#"<li class="b_algo"><h2><a href="{}">Result</a></h2></li>"#,
                href
            )
        })
        .collect();
    format!(
        r#"<html><body><ol id="b_results">{}</ol></body></html>"#,
        items
    )
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}
