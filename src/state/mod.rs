//! State module for tracking per-task pipeline progress
//!
//! # Components
//!
//! - `TaskStage`: The pipeline stage a task is in, or failed at
//! - `TaskOutcome`: The terminal result of one seed URL's task

mod task_state;

// Re-export main types
pub use task_state::{TaskOutcome, TaskStage};
