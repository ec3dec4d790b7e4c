//! Fixed text patterns: emails, phone numbers and visible page text

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use std::collections::{BTreeSet, HashSet};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern is valid")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+\d{1,2}\s?)?(\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b")
        .expect("phone pattern is valid")
});

/// Elements whose text never renders
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Finds email addresses in `text`
///
/// # Returns
///
/// Distinct addresses, sorted and joined with `", "`; empty if none
pub fn extract_emails(text: &str) -> String {
    let found: BTreeSet<&str> = EMAIL_REGEX.find_iter(text).map(|m| m.as_str()).collect();
    found.into_iter().collect::<Vec<_>>().join(", ")
}

/// Finds phone numbers in `text`
///
/// # Returns
///
/// Distinct trimmed matches in first-seen order, joined with `", "`
pub fn extract_phones(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut phones = Vec::new();
    for m in PHONE_REGEX.find_iter(text) {
        let phone = m.as_str().trim();
        if !phone.is_empty() && seen.insert(phone) {
            phones.push(phone);
        }
    }
    phones.join(", ")
}

/// Collects the human-visible text of a document, space separated
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}
