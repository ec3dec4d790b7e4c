//! Fixture checks run by `--test`
//!
//! Exercises email extraction, URL validation and rule-based extraction
//! against the fixtures in the `[tests]` configuration section.

use crate::config::Config;
use crate::crawler::{extract_emails, RuleBook};
use crate::identity::{IdentityManager, SessionLauncher};
use crate::url::UrlValidator;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;

/// Pass/fail per check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelfTestReport {
    pub email_extraction: bool,
    pub url_validation: bool,
    pub selector_extraction: bool,
}

impl SelfTestReport {
    pub fn all_passed(&self) -> bool {
        self.email_extraction && self.url_validation && self.selector_extraction
    }
}

/// Runs every self-test check; failures are logged, never raised
pub async fn run_self_tests(config: &Config, launcher: Arc<dyn SessionLauncher>) -> SelfTestReport {
    let fixtures = &config.tests;

    let email_extraction = emails_match(&fixtures.email_text, &fixtures.email_expected);

    let validator = UrlValidator::new(&config.identity, config.pacing.probe_timeout());
    let url_validation = validator.validate(&fixtures.validation_url).await.0;

    let selector_extraction = match selector_check(config, launcher).await {
        Ok(passed) => passed,
        Err(e) => {
            tracing::error!("Selector check failed: {}", e);
            false
        }
    };

    let report = SelfTestReport {
        email_extraction,
        url_validation,
        selector_extraction,
    };
    tracing::info!(?report, "Self-test finished");
    report
}

/// Compares extracted addresses with the expected set, order ignored
fn emails_match(text: &str, expected: &[String]) -> bool {
    let extracted = extract_emails(text);
    let mut actual: Vec<&str> = if extracted.is_empty() {
        Vec::new()
    } else {
        extracted.split(',').map(str::trim).collect()
    };
    let mut expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    actual.sort_unstable();
    expected.sort_unstable();
    actual == expected
}

async fn selector_check(
    config: &Config,
    launcher: Arc<dyn SessionLauncher>,
) -> crate::Result<bool> {
    let fixtures = &config.tests;
    let rules = RuleBook::compile(&config.selectors);

    let mut identity = IdentityManager::init(&config.identity, launcher).await?;
    let markup = load_markup(&mut identity, &fixtures.selector_url).await;
    identity.shutdown().await;

    Ok(name_contains(&rules, &markup?, &fixtures.selector_expected))
}

async fn load_markup(identity: &mut IdentityManager, url: &str) -> crate::SessionResult<String> {
    let session = identity.session()?;
    session.navigate(url).await?;
    session.page_source().await
}

fn name_contains(rules: &RuleBook, markup: &str, expected: &str) -> bool {
    let document = Html::parse_document(markup);
    rules
        .extract("company_name", &document, markup)
        .contains(expected)
}
