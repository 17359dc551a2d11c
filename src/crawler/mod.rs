//! Crawler module for the per-URL extraction pipeline
//!
//! This module contains:
//! - HTTP fetching with bounded retry and backoff
//! - Markup reduction to a text-and-links corpus
//! - Batch coordination over a bounded worker pool

mod coordinator;
mod fetcher;
mod reducer;

pub use coordinator::{Coordinator, TaskError};
pub use fetcher::{build_http_client, FetchError, FetchPolicy, Fetcher};
pub use reducer::{reduce, reduce_html, ReducedPage};
