//! Extraction collaborator interface and output parsing
//!
//! The pipeline hands a reduced corpus to an [`Extractor`] and gets back the
//! collaborator's raw text, which [`parse_payload`] reads with a strict literal
//! reader. Nothing in the collaborator's text is ever executed.

mod literal;
mod openai;

pub use literal::{parse_literal, parse_payload, LiteralValue, ParseError};
pub use openai::{build_prompt, OpenAiExtractor, ProviderError};

use async_trait::async_trait;

/// Field names the collaborator is asked to fill, in prompt order
///
/// `source` is deliberately absent; the pipeline sets it from the seed URL.
pub const EXTRACTED_FIELDS: [&str; 6] = ["url", "name", "description", "country", "city", "email"];

/// A collaborator that guesses a company record from page text
///
/// Implementations own their transient-error retry policy. `None` means the
/// collaborator produced nothing usable and the task ends there.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the serialized record guess for a corpus, if any
    async fn extract(&self, corpus: &str) -> Option<String>;
}
