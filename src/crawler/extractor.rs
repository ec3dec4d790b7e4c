//! Per-page field extraction
//!
//! [`PageExtractor::scrape_page`] visits a URL at most once per job and
//! appends exactly one [`ExtractionRecord`] for every visit, successful or not.

use crate::config::PacingConfig;
use crate::crawler::enrichment::TechStackClient;
use crate::crawler::pacing;
use crate::crawler::patterns::{extract_emails, extract_phones, visible_text};
use crate::crawler::rules::RuleBook;
use crate::identity::IdentityManager;
use crate::state::{CrawlLedger, ExtractionRecord, SocialLinks};
use crate::url::registrable_domain;
use crate::SessionResult;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element that marks a loaded document
const READY_SELECTOR: &str = "body";

/// How many fields are extracted from a page
///
/// Levels are cumulative: medium includes basic, advanced includes medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionLevel {
    /// Name, website, emails, phones
    #[default]
    Basic,

    /// Adds description, address and social links
    Medium,

    /// Adds the technology stack
    Advanced,
}

impl ExtractionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExtractionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "medium" => Ok(Self::Medium),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown extraction level '{}' (expected basic, medium or advanced)",
                other
            )),
        }
    }
}

/// Social platforms recognized in candidate links, by URL substring
const SOCIAL_PLATFORMS: [&str; 3] = ["linkedin.com", "twitter.com", "facebook.com"];

/// Sorts candidate links into platforms; the first match per platform wins
pub fn classify_social_links(candidates: &[String]) -> SocialLinks {
    let mut social = SocialLinks::default();

    for link in candidates {
        for platform in SOCIAL_PLATFORMS {
            if !link.contains(platform) {
                continue;
            }
            let slot = match platform {
                "linkedin.com" => &mut social.linkedin,
                "twitter.com" => &mut social.twitter,
                _ => &mut social.facebook,
            };
            if slot.is_empty() {
                *slot = link.clone();
            }
        }
    }

    social
}

/// Builds a successful record from loaded markup
///
/// # Arguments
///
/// * `rules` - Compiled rule book for the job
/// * `url` - The page URL
/// * `domain` - Registrable domain of `url`
/// * `markup` - Page source
/// * `level` - Which fields to fill
///
/// The tech stack is never filled here; it needs a network lookup.
pub fn extract_fields(
    rules: &RuleBook,
    url: &str,
    domain: &str,
    markup: &str,
    level: ExtractionLevel,
) -> ExtractionRecord {
    let document = Html::parse_document(markup);
    let mut record = ExtractionRecord::new(url);

    let name = rules.extract("company_name", &document, markup);
    record.name = if name.is_empty() {
        domain.to_string()
    } else {
        name
    };
    record.website = domain.to_string();

    let text = visible_text(&document);
    record.email = extract_emails(&text);
    record.phone = extract_phones(&text);

    if level >= ExtractionLevel::Medium {
        record.description = rules.extract("description", &document, markup);
        record.address = rules.extract("address", &document, markup);
        record.social = classify_social_links(&rules.collect("social", &document, markup));
    }

    record
}

/// Visits pages through the identity manager's session and extracts fields
pub struct PageExtractor {
    rules: RuleBook,
    enrichment: TechStackClient,
    pacing: PacingConfig,
}

impl PageExtractor {
    pub fn new(rules: RuleBook, enrichment: TechStackClient, pacing: PacingConfig) -> Self {
        Self {
            rules,
            enrichment,
            pacing,
        }
    }

    /// Scrapes one page into the ledger
    ///
    /// The URL is marked visited before anything else happens. A page that
    /// fails to load produces an error record, counts as an error and rotates
    /// the proxy; it is not retried.
    ///
    /// # Returns
    ///
    /// `false` if the URL had already been visited in this job
    pub async fn scrape_page(
        &self,
        ledger: &mut CrawlLedger,
        identity: &mut IdentityManager,
        url: &str,
        level: ExtractionLevel,
    ) -> bool {
        if !ledger.claim(url) {
            tracing::debug!(url, "Already visited, skipping");
            return false;
        }

        tracing::info!(url, %level, "Scraping");
        pacing::pause(self.pacing.min_delay, self.pacing.max_delay).await;

        let record = match self.load(identity, url).await {
            Ok(markup) => {
                let domain = registrable_domain(url).unwrap_or_default();
                let mut record = extract_fields(&self.rules, url, &domain, &markup, level);
                if level >= ExtractionLevel::Advanced {
                    record.tech_stack = self.enrichment.lookup(&domain).await;
                }
                tracing::info!(url, "Extracted data");
                record
            }
            Err(e) => {
                tracing::error!(url, "Error scraping page: {}", e);
                ledger.record_error();
                identity.rotate_proxy().await;
                ExtractionRecord::failed(url, e.to_string())
            }
        };

        ledger.push(record);
        pacing::pause(self.pacing.min_delay, self.pacing.max_delay).await;
        true
    }

    async fn load(&self, identity: &mut IdentityManager, url: &str) -> SessionResult<String> {
        let session = identity.session()?;
        session.navigate(url).await?;

        let (dx, dy) = pacing::pointer_offset(10, 100);
        if let Err(e) = session.move_pointer(dx, dy).await {
            tracing::debug!(url, "Pointer movement failed: {}", e);
        }

        session
            .wait_for(READY_SELECTOR, self.pacing.page_timeout())
            .await?;
        session.page_source().await
    }
}
