//! Output module for persisting records and reporting batch results
//!
//! This module handles:
//! - The append-only record sink and its CSV implementation
//! - Batch statistics and the end-of-run report

mod sink;
pub mod stats;
mod traits;

pub use sink::{CsvSink, MemorySink};
pub use stats::{print_report, BatchReport};
pub use traits::{OutputError, OutputResult, RecordSink};
