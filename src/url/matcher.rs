/// Checks whether `candidate` equals `base` or is a subdomain of it
///
/// # Examples
///
/// ```
/// use vc_harvester::url::is_same_or_subdomain;
///
/// assert!(is_same_or_subdomain("example.com", "example.com"));
/// assert!(is_same_or_subdomain("example.com", "investors.example.com"));
/// assert!(is_same_or_subdomain("example.com", "api.v2.example.com"));
/// assert!(!is_same_or_subdomain("example.com", "badexample.com"));
/// assert!(!is_same_or_subdomain("investors.example.com", "example.com"));
/// ```
pub fn is_same_or_subdomain(base: &str, candidate: &str) -> bool {
    candidate == base || candidate.ends_with(&format!(".{}", base))
}
