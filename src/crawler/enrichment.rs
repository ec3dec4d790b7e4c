//! Technology-stack enrichment through the BuiltWith lookup API
//!
//! Enrichment is best-effort: a missing key, a transport failure or an
//! unexpected answer all yield an empty string.

use crate::config::EnrichmentConfig;
use crate::identity::pick_random;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Lookup timeout
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(rename = "Results", default)]
    results: Vec<LookupResult>,
}

#[derive(Debug, Default, Deserialize)]
struct LookupResult {
    #[serde(rename = "Result", default)]
    result: ResultBody,
}

#[derive(Debug, Default, Deserialize)]
struct ResultBody {
    #[serde(rename = "Paths", default)]
    paths: Vec<PathEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct PathEntry {
    #[serde(rename = "Technologies", default)]
    technologies: Vec<Technology>,
}

#[derive(Debug, Default, Deserialize)]
struct Technology {
    #[serde(rename = "Name", default)]
    name: String,
}

/// Client for domain -> technology-name lookups
#[derive(Debug, Clone)]
pub struct TechStackClient {
    client: Client,
    api_key: String,
    endpoint: String,
    user_agents: Vec<String>,
}

impl TechStackClient {
    /// Builds a client for the configured endpoint
    ///
    /// # Arguments
    ///
    /// * `config` - API key and endpoint
    /// * `user_agents` - Pool to draw a user agent from for each lookup
    pub fn new(config: &EnrichmentConfig, user_agents: &[String]) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .connect_timeout(LOOKUP_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            endpoint: config.endpoint.clone(),
            user_agents: user_agents.to_vec(),
        })
    }

    /// Returns true if an API key is configured
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Looks up the technologies used by `domain`
    ///
    /// # Returns
    ///
    /// Technology names joined with `", "`, or an empty string when the
    /// lookup is disabled or fails
    pub async fn lookup(&self, domain: &str) -> String {
        if !self.is_enabled() || domain.is_empty() {
            return String::new();
        }

        match self.fetch(domain).await {
            Ok(names) => names.join(", "),
            Err(reason) => {
                tracing::warn!(domain, "Tech stack lookup failed: {}", reason);
                String::new()
            }
        }
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<String>, String> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("KEY", self.api_key.as_str()), ("LOOKUP", domain)]);

        if let Some(ua) = pick_random(&self.user_agents) {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        if response.status() != StatusCode::OK {
            return Err(format!("status {}", response.status().as_u16()));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        parse_technologies(&body).map_err(|e| e.to_string())
    }
}

/// Collects every technology name from a lookup answer, empties dropped
fn parse_technologies(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let response: LookupResponse = serde_json::from_str(body)?;

    let names = response
        .results
        .into_iter()
        .flat_map(|r| r.result.paths)
        .flat_map(|p| p.technologies)
        .map(|t| t.name)
        .filter(|name| !name.is_empty())
        .collect();

    Ok(names)
}
