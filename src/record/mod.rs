//! Company records and raw extraction payloads
//!
//! A [`RawPayload`] is the untyped mapping read from the collaborator's text.
//! It is consumed by the [`Validator`], which either promotes it into a
//! [`CompanyRecord`] or rejects it whole.

mod validator;

pub use validator::{ValidationError, Validator};

use crate::extraction::{parse_payload, LiteralValue, ParseError};
use std::collections::BTreeMap;

/// Column order of the persisted sink
pub const CSV_HEADER: [&str; 7] = [
    "url",
    "name",
    "description",
    "source",
    "country",
    "city",
    "email",
];

/// A validated company record
///
/// `source` is always the seed page the record came from. `url`, when set, is a
/// well-formed web URL on a different host than `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub url: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub source: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
}

impl CompanyRecord {
    /// Renders the record as one sink row in [`CSV_HEADER`] order; absent fields are empty
    pub fn to_row(&self) -> [&str; 7] {
        fn field(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }
        [
            field(&self.url),
            field(&self.name),
            field(&self.description),
            &self.source,
            field(&self.country),
            field(&self.city),
            field(&self.email),
        ]
    }
}

/// Untyped field mapping produced from collaborator output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    fields: BTreeMap<String, LiteralValue>,
}

impl RawPayload {
    /// Wraps an already-parsed mapping
    pub fn new(fields: BTreeMap<String, LiteralValue>) -> Self {
        Self { fields }
    }

    /// Reads collaborator text into a payload
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_payload(text).map(Self::new)
    }

    /// Returns a field, if present
    pub fn get(&self, key: &str) -> Option<&LiteralValue> {
        self.fields.get(key)
    }

    /// Sets a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: LiteralValue) {
        self.fields.insert(key.into(), value);
    }

    /// Removes and returns a field
    pub fn take(&mut self, key: &str) -> Option<LiteralValue> {
        self.fields.remove(key)
    }

    /// Overwrites `source` with the seed URL
    pub fn set_source(&mut self, source: &str) {
        self.insert("source", LiteralValue::Str(source.to_string()));
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
