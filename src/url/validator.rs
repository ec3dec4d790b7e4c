//! Reachability probe for candidate URLs
//!
//! A validated URL is one that answers a HEAD request with HTTP 200 after
//! following redirects. The probe never raises: every failure is folded into
//! `is_valid = false`.

use crate::config::IdentityConfig;
use crate::identity::pick_random;
use crate::url::normalize::ensure_scheme;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Default probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes URLs with a randomized identity
#[derive(Debug, Clone)]
pub struct UrlValidator {
    user_agents: Vec<String>,
    proxies: Vec<String>,
    timeout: Duration,
}

impl UrlValidator {
    /// Creates a validator drawing identities from the given pools
    pub fn new(identity: &IdentityConfig, timeout: Duration) -> Self {
        Self {
            user_agents: identity.user_agents.clone(),
            proxies: identity.proxies.clone(),
            timeout,
        }
    }

    /// Validator without identity pools, using the default timeout
    pub fn plain() -> Self {
        Self::new(&IdentityConfig::default(), DEFAULT_PROBE_TIMEOUT)
    }

    /// Normalizes a URL and probes it
    ///
    /// # Returns
    ///
    /// `(is_valid, normalized_url)`. `is_valid` is true only for a 200
    /// response; transport failures are logged and reported as invalid.
    pub async fn validate(&self, url: &str) -> (bool, String) {
        let normalized = ensure_scheme(url);

        let is_valid = match self.probe(&normalized).await {
            Ok(status) => {
                tracing::debug!(url = %normalized, status = status.as_u16(), "Probe answered");
                status == StatusCode::OK
            }
            Err(e) => {
                tracing::error!(url = %normalized, "URL validation error: {}", e);
                false
            }
        };

        (is_valid, normalized)
    }

    async fn probe(&self, url: &str) -> Result<StatusCode, reqwest::Error> {
        let client = self.build_client()?;
        let mut request = client.head(url);

        if let Some(ua) = pick_random(&self.user_agents) {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }

        let response = request.send().await?;
        Ok(response.status())
    }

    /// Proxies are bound per client, so each probe builds its own
    fn build_client(&self) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .redirect(Policy::limited(10));

        if let Some(proxy) = pick_random(&self.proxies) {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        builder.build()
    }
}
