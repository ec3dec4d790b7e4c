//! Same-domain link discovery from a seed page
//!
//! Discovery walks a worklist of `(page, remaining_depth)` pairs breadth
//! first. Every unvisited same-site link is scraped once, then queued for
//! its own discovery while depth remains.

use crate::crawler::extractor::{ExtractionLevel, PageExtractor};
use crate::crawler::links::extract_page_links;
use crate::identity::IdentityManager;
use crate::state::CrawlLedger;
use crate::url::same_site;
use crate::{SessionError, SessionResult};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Discovered pages get the basic field set
pub const DISCOVERY_LEVEL: ExtractionLevel = ExtractionLevel::Basic;

/// Bounded same-site crawler
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlFrontier {
    max_pages: Option<usize>,
}

impl CrawlFrontier {
    /// Creates a frontier; `max_pages` caps the pages one discovery may scrape
    pub fn new(max_pages: Option<usize>) -> Self {
        Self { max_pages }
    }

    /// Discovers and scrapes same-site pages reachable from `seed_url`
    ///
    /// A page that fails to load ends only its own branch; the failure is
    /// counted in the ledger.
    ///
    /// # Arguments
    ///
    /// * `extractor` - Scrapes each discovered page
    /// * `ledger` - Visited set, records and error counter of the job
    /// * `identity` - Session to browse with
    /// * `seed_url` - Starting page; only links on its registrable domain are followed
    /// * `depth` - Link levels to follow; 0 does nothing
    ///
    /// # Returns
    ///
    /// Number of pages scraped
    pub async fn discover(
        &self,
        extractor: &PageExtractor,
        ledger: &mut CrawlLedger,
        identity: &mut IdentityManager,
        seed_url: &str,
        depth: u32,
    ) -> usize {
        if depth == 0 {
            return 0;
        }

        let mut worklist: VecDeque<(String, u32)> = VecDeque::new();
        worklist.push_back((seed_url.to_string(), depth));
        let mut scraped = 0;

        while let Some((page_url, remaining)) = worklist.pop_front() {
            let links = match self.fetch_links(identity, &page_url).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::error!(url = %page_url, "URL discovery error: {}", e);
                    ledger.record_error();
                    continue;
                }
            };

            tracing::debug!(url = %page_url, count = links.len(), remaining, "Discovered links");

            for target in links {
                if !same_site(&target, seed_url) || ledger.is_visited(&target) {
                    continue;
                }

                if self.max_pages.is_some_and(|cap| scraped >= cap) {
                    tracing::info!(seed = seed_url, scraped, "Discovery page cap reached");
                    return scraped;
                }

                extractor
                    .scrape_page(ledger, identity, &target, DISCOVERY_LEVEL)
                    .await;
                scraped += 1;

                if remaining > 1 {
                    worklist.push_back((target, remaining - 1));
                }
            }
        }

        scraped
    }

    async fn fetch_links(
        &self,
        identity: &mut IdentityManager,
        page_url: &str,
    ) -> SessionResult<Vec<String>> {
        let base = Url::parse(page_url).map_err(|e| SessionError::Navigation {
            url: page_url.to_string(),
            message: e.to_string(),
        })?;

        let session = identity.session()?;
        session.navigate(page_url).await?;
        let markup = session.page_source().await?;

        let mut links = extract_page_links(&markup, &base);
        let mut seen = HashSet::new();
        links.retain(|link| seen.insert(link.clone()));
        Ok(links)
    }
}
