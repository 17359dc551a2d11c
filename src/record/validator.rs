//! Payload validation
//!
//! Validation runs in two stages:
//! 1. Domain-collision heuristics drop fields that point back at the seed's own
//!    site (the collaborator tends to echo the VC's domain when it cannot find
//!    the startup's). Dropped values are discarded, never corrected.
//! 2. Schema coercion turns the payload into a [`CompanyRecord`] or rejects it.

use crate::extraction::LiteralValue;
use crate::record::{CompanyRecord, RawPayload};
use crate::url::{email_domain, extract_host, parse_web_url, HostMatch};
use thiserror::Error;

/// A payload that does not fit the company record shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Schema violation in '{field}': {reason}")]
    SchemaViolation { field: &'static str, reason: String },
}

impl ValidationError {
    fn schema(field: &'static str, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field,
            reason: reason.into(),
        }
    }
}

/// Validates raw payloads against a seed URL
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    host_match: HostMatch,
}

impl Validator {
    /// Creates a validator with the given host comparison
    pub fn new(host_match: HostMatch) -> Self {
        Self { host_match }
    }

    /// The host comparison in use
    pub fn host_match(&self) -> HostMatch {
        self.host_match
    }

    /// Validates a payload derived from `source_url`
    ///
    /// # Returns
    ///
    /// * `Ok(CompanyRecord)` - A complete record with `source` set to `source_url`
    /// * `Err(ValidationError)` - The payload was rejected; nothing should be persisted
    ///
    /// # Example
    ///
    /// ```
    /// use vc_harvester::record::{RawPayload, Validator};
    ///
    /// let payload = RawPayload::parse("{'url': 'https://www.dcvc.com/companies/platfora/', 'name': 'Platfora'}").unwrap();
    /// let record = Validator::default()
    ///     .validate(payload, "https://www.dcvc.com/companies/platfora/")
    ///     .unwrap();
    /// assert_eq!(record.url, None);
    /// assert_eq!(record.name.as_deref(), Some("Platfora"));
    /// ```
    pub fn validate(
        &self,
        mut payload: RawPayload,
        source_url: &str,
    ) -> Result<CompanyRecord, ValidationError> {
        let source = parse_web_url(source_url)
            .map_err(|e| ValidationError::schema("source", e.to_string()))?;
        let source_host = extract_host(&source)
            .ok_or_else(|| ValidationError::schema("source", "missing host"))?;
        payload.set_source(source_url.trim());

        let mut url = coerce_text("url", payload.take("url"))?;
        let mut email = coerce_text("email", payload.take("email"))?;

        // Stage 1: domain-collision heuristics
        if let Some(candidate) = url.as_deref() {
            if self.is_self_referential_url(candidate, &source_host) {
                tracing::warn!(
                    "Discarding url '{}': same host as source {}",
                    candidate,
                    source_url
                );
                url = None;
            }
        }

        if let Some(addresses) = email.take() {
            email = self.prune_emails(&addresses, &source_host, source_url);
        }

        // Stage 2: schema
        if let Some(candidate) = url.as_deref() {
            parse_web_url(candidate).map_err(|e| ValidationError::schema("url", e.to_string()))?;
        }

        let source = match payload.take("source") {
            Some(LiteralValue::Str(s)) => s,
            _ => return Err(ValidationError::schema("source", "missing")),
        };

        Ok(CompanyRecord {
            url,
            name: coerce_text("name", payload.take("name"))?,
            description: coerce_text("description", payload.take("description"))?,
            source,
            country: coerce_text("country", payload.take("country"))?,
            city: coerce_text("city", payload.take("city"))?,
            email,
        })
    }

    /// Returns true if `candidate` parses and its host collides with the source host
    ///
    /// Unparseable candidates are left for the schema stage.
    fn is_self_referential_url(&self, candidate: &str, source_host: &str) -> bool {
        parse_web_url(candidate)
            .ok()
            .and_then(|url| extract_host(&url))
            .map(|host| self.host_match.collides(&host, source_host))
            .unwrap_or(false)
    }

    /// Keeps only addresses whose domain differs from the source host
    ///
    /// Entries without a recognizable domain are kept. Returns `None` if nothing remains.
    fn prune_emails(&self, addresses: &str, source_host: &str, source_url: &str) -> Option<String> {
        let kept: Vec<&str> = addresses
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .filter(|address| match email_domain(address) {
                Some(domain) if self.host_match.collides(&domain, source_host) => {
                    tracing::warn!(
                        "Discarding email '{}': same domain as source {}",
                        address,
                        source_url
                    );
                    false
                }
                _ => true,
            })
            .collect();

        if kept.is_empty() {
            None
        } else {
            Some(kept.join(", "))
        }
    }
}

/// Coerces a literal into optional text
///
/// Strings are trimmed and empty strings become absent; lists of scalars are
/// joined with `", "`; numbers and booleans are stringified. Mappings and nested
/// lists are schema violations.
fn coerce_text(
    field: &'static str,
    value: Option<LiteralValue>,
) -> Result<Option<String>, ValidationError> {
    let value = match value {
        Some(value) => value,
        None => return Ok(None),
    };

    let text = match value {
        LiteralValue::None => return Ok(None),
        LiteralValue::Str(s) => s.trim().to_string(),
        LiteralValue::Bool(_) | LiteralValue::Int(_) | LiteralValue::Float(_) => value.to_string(),
        LiteralValue::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    LiteralValue::None => {}
                    LiteralValue::List(_) | LiteralValue::Dict(_) => {
                        return Err(ValidationError::schema(field, "nested values are not allowed"));
                    }
                    LiteralValue::Str(s) => parts.push(s.trim().to_string()),
                    scalar => parts.push(scalar.to_string()),
                }
            }
            parts.retain(|part| !part.is_empty());
            parts.join(", ")
        }
        LiteralValue::Dict(_) => {
            return Err(ValidationError::schema(field, "expected text, found a mapping"));
        }
    };

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}
