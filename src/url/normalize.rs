/// Default scheme applied to bare host names
const DEFAULT_SCHEME: &str = "https://";

/// Prefixes `https://` when the URL carries no scheme
///
/// The input is otherwise returned untouched (no trailing-slash or case
/// rewriting), so a URL that already has a scheme round-trips unchanged.
///
/// # Examples
///
/// ```
/// use company_harvester::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("example.com"), "https://example.com");
/// assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
/// ```
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, trimmed.trim_start_matches('/'))
    }
}

/// Checks for an explicit `scheme://` prefix
fn has_scheme(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}
