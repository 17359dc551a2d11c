use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Arguments
///
/// * `url` - The URL to extract the host from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use vc_harvester::url::extract_host;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("www.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips a single leading `www.` label from a host
///
/// ```
/// use vc_harvester::url::strip_www;
///
/// assert_eq!(strip_www("www.example.com"), "example.com");
/// assert_eq!(strip_www("example.com"), "example.com");
/// assert_eq!(strip_www("www2.example.com"), "www2.example.com");
/// ```
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Extracts the lowercase domain part of an email entry
///
/// Accepts display-name forms (`Team <info@example.com>`), parenthesized or
/// quoted addresses and an optional `mailto:` prefix. Returns `None` when there
/// is no `@` or the domain part is empty.
pub fn email_domain(entry: &str) -> Option<String> {
    let entry = entry.trim();
    let address = match (entry.find('<'), entry.rfind('>')) {
        (Some(open), Some(close)) if open < close => &entry[open + 1..close],
        _ => entry,
    };
    let address = address.trim();
    let address = address.strip_prefix("mailto:").unwrap_or(address);

    let (_, domain) = address.rsplit_once('@')?;
    let domain = domain
        .trim_start_matches(is_address_delimiter)
        .split(is_address_delimiter)
        .next()
        .unwrap_or("")
        .trim_end_matches('.');

    if domain.is_empty() {
        None
    } else {
        Some(domain.to_lowercase())
    }
}

fn is_address_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | '(' | ')' | '[' | ']' | '"' | '\'' | ',' | ';')
}
