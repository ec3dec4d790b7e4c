use url::{Host, Url};

/// Resolves the registrable domain (public suffix + 1 label) of a URL
///
/// IP addresses and single-label hosts such as `localhost` have no public
/// suffix; the bare host is returned for them so that same-site checks still
/// work against local servers.
///
/// # Examples
///
/// ```
/// use company_harvester::url::registrable_domain;
///
/// assert_eq!(registrable_domain("https://www.example.co.uk/about"), Some("example.co.uk".to_string()));
/// assert_eq!(registrable_domain("https://blog.example.com"), Some("example.com".to_string()));
/// assert_eq!(registrable_domain("not a url"), None);
/// ```
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    match parsed.host()? {
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
        Host::Domain(domain) => {
            let host = domain.trim_end_matches('.').to_lowercase();
            if !host.contains('.') {
                return Some(host);
            }
            psl::domain_str(&host).map(|d| d.to_string())
        }
    }
}

/// Returns true if both URLs resolve to the same registrable domain
pub fn same_site(a: &str, b: &str) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
