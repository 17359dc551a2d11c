//! Record sink trait and error types
//!
//! This module defines the interface every persistence backend implements.

use crate::record::CompanyRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink writer lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// An append-only destination for validated records
///
/// Implementations are shared across concurrently running tasks and must
/// serialize their physical writes so rows never interleave.
pub trait RecordSink: Send + Sync {
    /// Appends one record
    ///
    /// # Arguments
    ///
    /// * `record` - The validated record to persist whole
    fn persist(&self, record: &CompanyRecord) -> OutputResult<()>;

    /// Human-readable name of the sink, used in logs
    fn name(&self) -> String;
}
