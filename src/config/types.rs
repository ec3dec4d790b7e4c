use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Upper bound for any configured delay, backoff or timeout, in seconds
pub const MAX_PACING_SECONDS: f64 = 3600.0;

/// Converts a configured second count to a `Duration`
///
/// Values are clamped to `[0, MAX_PACING_SECONDS]`; NaN becomes zero.
pub fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_PACING_SECONDS)).unwrap_or(Duration::ZERO)
}

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub pacing: PacingConfig,
    pub search: SearchConfig,
    pub enrichment: EnrichmentConfig,
    pub crawl: CrawlConfig,

    /// Default selector rules keyed by field category
    /// (`company_name`, `description`, `address`, `social`)
    pub selectors: BTreeMap<String, Vec<String>>,

    /// Fixtures for the `--test` self-check mode
    pub tests: SelfTestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            pacing: PacingConfig::default(),
            search: SearchConfig::default(),
            enrichment: EnrichmentConfig::default(),
            crawl: CrawlConfig::default(),
            selectors: default_selectors(),
            tests: SelfTestConfig::default(),
        }
    }
}

/// Rules used when the configuration has no `[selectors]` table
pub fn default_selectors() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 4] = [
        (
            "company_name",
            &["title", "//meta[@property='og:site_name']/@content"],
        ),
        ("description", &["meta[name='description']"]),
        ("address", &["address"]),
        (
            "social",
            &[
                "//a[contains(@href,'linkedin.com')]/@href",
                "//a[contains(@href,'twitter.com')]/@href",
                "//a[contains(@href,'facebook.com')]/@href",
            ],
        ),
    ];

    table
        .iter()
        .map(|(category, rules)| {
            (
                category.to_string(),
                rules.iter().map(|rule| rule.to_string()).collect(),
            )
        })
        .collect()
}

/// Which session engine backs the identity manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEngine {
    /// Plain HTTP client with browser-like headers
    #[default]
    Http,
    /// Headless Chromium (requires the `headless` feature)
    Chromium,
}

/// Identity pools used for rotation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub engine: SessionEngine,

    /// User agents to pick from; empty means the engine default is kept
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Proxy URLs to pick from; empty disables proxy rotation
    pub proxies: Vec<String>,
}

/// Randomized pacing and per-operation timeouts, all in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay bounds applied before and after each page scrape
    #[serde(rename = "min-delay")]
    pub min_delay: f64,
    #[serde(rename = "max-delay")]
    pub max_delay: f64,

    /// Delay bounds applied before each search results request
    #[serde(rename = "search-min-delay")]
    pub search_min_delay: f64,
    #[serde(rename = "search-max-delay")]
    pub search_max_delay: f64,

    /// Delay bounds applied after a successful search page
    #[serde(rename = "settle-min-delay")]
    pub settle_min_delay: f64,
    #[serde(rename = "settle-max-delay")]
    pub settle_max_delay: f64,

    /// Linear backoff unit between search attempts
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    /// Wait for document readiness on a company page
    #[serde(rename = "page-timeout")]
    pub page_timeout: f64,

    /// Wait for the search results container
    #[serde(rename = "results-timeout")]
    pub results_timeout: f64,

    /// Timeout of the reachability probe
    #[serde(rename = "probe-timeout")]
    pub probe_timeout: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay: 2.0,
            max_delay: 5.0,
            search_min_delay: 1.5,
            search_max_delay: 3.5,
            settle_min_delay: 0.8,
            settle_max_delay: 2.0,
            backoff_base: 5.0,
            page_timeout: 20.0,
            results_timeout: 15.0,
            probe_timeout: 5.0,
        }
    }
}

impl PacingConfig {
    /// Pacing with every delay at zero and short timeouts, for tests
    pub fn immediate() -> Self {
        Self {
            min_delay: 0.0,
            max_delay: 0.0,
            search_min_delay: 0.0,
            search_max_delay: 0.0,
            settle_min_delay: 0.0,
            settle_max_delay: 0.0,
            backoff_base: 0.0,
            page_timeout: 5.0,
            results_timeout: 5.0,
            probe_timeout: 5.0,
        }
    }

    pub fn backoff_base(&self) -> Duration {
        seconds(self.backoff_base)
    }

    pub fn page_timeout(&self) -> Duration {
        seconds(self.page_timeout)
    }

    pub fn results_timeout(&self) -> Duration {
        seconds(self.results_timeout)
    }

    pub fn probe_timeout(&self) -> Duration {
        seconds(self.probe_timeout)
    }
}

/// Search engine endpoint and result markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(rename = "engine-url")]
    pub engine_url: String,

    /// Container whose presence means the results page rendered
    #[serde(rename = "results-selector")]
    pub results_selector: String,

    /// Anchors holding the organic result links
    #[serde(rename = "link-selector")]
    pub link_selector: String,

    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "page-size")]
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: "https://www.bing.com/search".to_string(),
            results_selector: "ol#b_results".to_string(),
            link_selector: "ol#b_results li.b_algo h2 a".to_string(),
            max_retries: 3,
            page_size: 10,
        }
    }
}

/// Technology lookup service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// API key; an empty key disables the lookup
    #[serde(rename = "api-key")]
    pub api_key: String,
    pub endpoint: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.builtwith.com/v19/api.json".to_string(),
        }
    }
}

/// Same-domain discovery limits
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum pages scraped by a single discovery pass
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,
}

/// Fixtures exercised by the self-test mode
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelfTestConfig {
    #[serde(rename = "email-text")]
    pub email_text: String,
    #[serde(rename = "email-expected")]
    pub email_expected: Vec<String>,
    #[serde(rename = "validation-url")]
    pub validation_url: String,
    #[serde(rename = "selector-url")]
    pub selector_url: String,
    #[serde(rename = "selector-expected")]
    pub selector_expected: String,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            email_text:
                "Contact: sales@example.com, support@test.org, bad-email@, valid@test.co.uk"
                    .to_string(),
            email_expected: vec![
                "sales@example.com".to_string(),
                "support@test.org".to_string(),
                "valid@test.co.uk".to_string(),
            ],
            validation_url: "https://google.com".to_string(),
            selector_url: "https://example.com".to_string(),
            selector_expected: "Example Domain".to_string(),
        }
    }
}
