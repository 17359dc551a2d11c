//! URL handling module for VC-Harvester
//!
//! This module provides host extraction, web URL parsing, and the host comparison
//! used to detect when an extracted field points back at the seed's own site.

mod domain;
mod matcher;

use crate::{UrlError, UrlResult};
use serde::Deserialize;
use url::Url;

// Re-export main functions
pub use domain::{email_domain, extract_host, strip_www};
pub use matcher::is_same_or_subdomain;

/// How strictly two hosts are compared when checking for a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostMatch {
    /// Lowercase hosts must be identical
    Exact,
    /// A single leading `www.` is ignored on both sides
    #[default]
    StripWww,
    /// Like `StripWww`, but a subdomain of the other host also collides
    Subdomain,
}

impl HostMatch {
    /// Returns true if the two hosts are considered the same site
    ///
    /// Both inputs are compared case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_harvester::url::HostMatch;
    ///
    /// assert!(HostMatch::StripWww.collides("www.example.com", "example.com"));
    /// assert!(!HostMatch::Exact.collides("www.example.com", "example.com"));
    /// assert!(!HostMatch::StripWww.collides("investors.example.com", "example.com"));
    /// assert!(HostMatch::Subdomain.collides("investors.example.com", "example.com"));
    /// ```
    pub fn collides(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        match self {
            Self::Exact => a == b,
            Self::StripWww => strip_www(&a) == strip_www(&b),
            Self::Subdomain => {
                let (a, b) = (strip_www(&a), strip_www(&b));
                is_same_or_subdomain(a, b) || is_same_or_subdomain(b, a)
            }
        }
    }
}

/// Parses an absolute `http`/`https` URL that carries a host
///
/// # Arguments
///
/// * `input` - The raw URL text; surrounding whitespace is ignored
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The text is not a usable web URL
///
/// # Examples
///
/// ```
/// use vc_harvester::url::parse_web_url;
///
/// assert!(parse_web_url("https://btn.vc/portfolio/hivewealth-2/").is_ok());
/// assert!(parse_web_url("ftp://example.com/").is_err());
/// assert!(parse_web_url("amphista.com").is_err());
/// ```
pub fn parse_web_url(input: &str) -> UrlResult<Url> {
    let input = input.trim();
    let url = Url::parse(input).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(input.to_string())),
    }
}
