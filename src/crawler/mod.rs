//! Crawler module: search acquisition, page extraction and discovery
//!
//! This module contains the harvesting pipeline:
//! - Search result acquisition with retries and identity rotation
//! - Rule-driven field extraction from company pages
//! - Same-domain link discovery
//! - Technology-stack enrichment

mod enrichment;
mod extractor;
mod frontier;
mod links;
mod pacing;
mod patterns;
mod retry;
mod rules;
mod search;

pub use enrichment::TechStackClient;
pub use extractor::{classify_social_links, extract_fields, ExtractionLevel, PageExtractor};
pub use frontier::{CrawlFrontier, DISCOVERY_LEVEL};
pub use links::{extract_page_links, extract_result_links};
pub use pacing::{jitter, pause};
pub use patterns::{extract_emails, extract_phones, visible_text};
pub use retry::{RetryPolicy, Retryable};
pub use rules::{parse_selector_overrides, RuleBook, RuleError, RuleTarget, SelectorRule};
pub use search::{has_challenge_marker, AttemptError, SearchAcquirer};
