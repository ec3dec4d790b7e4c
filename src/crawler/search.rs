//! Candidate URL acquisition from a search engine
//!
//! Each result page is fetched under a [`RetryPolicy`]. Between failed
//! attempts the identity is rotated (user agent in place, then proxy) and the
//! worker backs off linearly.

use crate::config::{PacingConfig, SearchConfig};
use crate::crawler::links::extract_result_links;
use crate::crawler::pacing;
use crate::crawler::retry::{RetryPolicy, Retryable};
use crate::identity::IdentityManager;
use crate::state::CrawlLedger;
use crate::url::UrlValidator;
use crate::SessionError;
use thiserror::Error;
use url::Url;

/// Case-insensitive markers of an anti-bot interstitial
const CHALLENGE_MARKERS: [&str; 3] = ["captcha", "sorry", "security check"];

/// Why a single attempt at a result page failed
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    #[error("results did not load: {0}")]
    Timeout(SessionError),

    #[error("anti-bot challenge detected")]
    AntiBot,

    #[error("no result URLs found")]
    NoResults,

    #[error("{0}")]
    Session(SessionError),
}

impl From<SessionError> for AttemptError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Timeout { .. } => Self::Timeout(e),
            other => Self::Session(other),
        }
    }
}

impl Retryable for AttemptError {
    /// Every attempt failure is transient; rotation may get past it
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Returns true if the markup looks like an anti-bot page
pub fn has_challenge_marker(markup: &str) -> bool {
    let lowered = markup.to_lowercase();
    CHALLENGE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Collects candidate company URLs for a query
#[derive(Debug, Clone)]
pub struct SearchAcquirer {
    settings: SearchConfig,
    pacing: PacingConfig,
    validator: UrlValidator,
}

impl SearchAcquirer {
    pub fn new(settings: SearchConfig, pacing: PacingConfig, validator: UrlValidator) -> Self {
        Self {
            settings,
            pacing,
            validator,
        }
    }

    /// Builds the result page URL for `query` at 0-based `page`
    pub fn search_url(&self, query: &str, page: u32) -> Result<Url, url::ParseError> {
        let offset = u64::from(page) * u64::from(self.settings.page_size);
        Url::parse_with_params(
            &self.settings.engine_url,
            &[("q", query.to_string()), ("first", offset.to_string())],
        )
    }

    /// Fetches up to `page_count` result pages and returns validated URLs
    ///
    /// Failed attempts are counted in the ledger's error counter. A page that
    /// exhausts its attempts is abandoned and the next page is tried. Never
    /// fails outward; an empty vector means nothing usable was found.
    ///
    /// # Arguments
    ///
    /// * `ledger` - Error counter of the running job
    /// * `identity` - Session to search with, rotated between attempts
    /// * `query` - Search terms
    /// * `page_count` - Number of result pages to walk
    /// * `max_retries` - Attempts allowed per result page
    pub async fn fetch_candidate_urls(
        &self,
        ledger: &mut CrawlLedger,
        identity: &mut IdentityManager,
        query: &str,
        page_count: u32,
        max_retries: u32,
    ) -> Vec<String> {
        let policy = RetryPolicy::linear(max_retries, self.pacing.backoff_base());
        let mut urls: Vec<String> = Vec::new();

        for page in 0..page_count {
            for attempt in 1..=policy.max_attempts() {
                tracing::info!(query, page = page + 1, attempt, "Searching");

                let outcome = self
                    .fetch_results_page(identity, query, page, &urls, policy.is_final(attempt))
                    .await;

                match outcome {
                    Ok(found) => {
                        tracing::info!(page = page + 1, count = found.len(), "Found URLs");
                        urls.extend(found);
                        break;
                    }
                    Err(e) => {
                        ledger.record_error();
                        tracing::warn!(page = page + 1, attempt, "Search attempt failed: {}", e);

                        if !policy.should_retry(&e, attempt) {
                            tracing::error!(
                                page = page + 1,
                                "Failed to fetch page after {} attempts",
                                attempt
                            );
                            break;
                        }

                        identity.rotate_user_agent().await;
                        identity.rotate_proxy().await;
                        tokio::time::sleep(policy.backoff(attempt)).await;
                    }
                }
            }
        }

        // Results can go stale while later pages are fetched
        let mut fresh = Vec::with_capacity(urls.len());
        for url in urls {
            if self.validator.validate(&url).await.0 {
                fresh.push(url);
            } else {
                tracing::debug!(url, "Dropping URL that no longer validates");
            }
        }
        fresh
    }

    async fn fetch_results_page(
        &self,
        identity: &mut IdentityManager,
        query: &str,
        page: u32,
        accumulated: &[String],
        is_final: bool,
    ) -> Result<Vec<String>, AttemptError> {
        pacing::pause(self.pacing.search_min_delay, self.pacing.search_max_delay).await;

        let search_url = self.search_url(query, page).map_err(|e| {
            AttemptError::Session(SessionError::Navigation {
                url: self.settings.engine_url.clone(),
                message: e.to_string(),
            })
        })?;

        let session = identity.session()?;
        session.navigate(search_url.as_str()).await?;

        let (dx, dy) = pacing::pointer_offset(10, 100);
        if let Err(e) = session.move_pointer(dx, dy).await {
            tracing::debug!("Pointer movement failed: {}", e);
        }

        session
            .wait_for(&self.settings.results_selector, self.pacing.results_timeout())
            .await?;

        let markup = session.page_source().await?;
        if has_challenge_marker(&markup) {
            tracing::warn!(page = page + 1, "Anti-bot challenge detected");
            return Err(AttemptError::AntiBot);
        }

        let hrefs = extract_result_links(&markup, &self.settings.link_selector)
            .map_err(|reason| AttemptError::Session(SessionError::Script(reason)))?;

        let mut found: Vec<String> = Vec::new();
        for href in hrefs {
            let (is_valid, normalized) = self.validator.validate(&href).await;
            if is_valid && !accumulated.contains(&normalized) && !found.contains(&normalized) {
                found.push(normalized);
            }
        }

        if found.is_empty() {
            if !is_final {
                return Err(AttemptError::NoResults);
            }
            tracing::warn!(page = page + 1, "No URLs found on final attempt");
        }

        let session = identity.session()?;
        if let Err(e) = session.scroll_to_bottom().await {
            tracing::debug!("Scroll failed: {}", e);
        }
        let (dx, dy) = pacing::pointer_offset(-50, 50);
        if let Err(e) = session.move_pointer(dx, dy).await {
            tracing::debug!("Pointer movement failed: {}", e);
        }
        pacing::pause(self.pacing.settle_min_delay, self.pacing.settle_max_delay).await;

        Ok(found)
    }
}
