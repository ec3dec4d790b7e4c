//! Link extraction from fetched markup
//!
//! Two flavours are needed:
//! - same-page anchors, resolved against the page URL, for discovery
//! - result anchors on a search page, which must already be absolute

use scraper::{Html, Selector};
use url::Url;

/// Extracts every followable anchor from a page as an absolute URL
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
///
/// # Arguments
///
/// * `html` - The page markup
/// * `base_url` - The page URL, used to resolve relative links
///
/// # Returns
///
/// Absolute http(s) URLs in document order, duplicates kept
pub fn extract_page_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Extracts result hrefs from a search results page
///
/// Only absolute links carrying a host are returned; relative links point
/// back into the search engine itself.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - hrefs in document order
/// * `Err(String)` - `link_selector` is not a valid selector
pub fn extract_result_links(html: &str, link_selector: &str) -> Result<Vec<String>, String> {
    let selector = Selector::parse(link_selector)
        .map_err(|e| format!("invalid link selector '{}': {:?}", link_selector, e))?;
    let document = Html::parse_document(html);

    let links = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| {
            Url::parse(href)
                .map(|url| url.host_str().is_some_and(|h| !h.is_empty()))
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect();

    Ok(links)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
