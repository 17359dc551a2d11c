//! Batch run statistics
//!
//! A [`BatchReport`] is filled in by the coordinator as tasks finish and
//! printed at the end of a run.

use crate::state::{TaskOutcome, TaskStage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Summary of one batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// When the batch started
    pub started_at: DateTime<Utc>,

    /// When the last task finished
    pub finished_at: Option<DateTime<Utc>>,

    /// Number of seed URLs submitted
    pub submitted: u64,

    /// Number of records appended to the sink
    pub persisted: u64,

    /// Failed tasks counted by the stage they stopped at
    pub failures: HashMap<TaskStage, u64>,

    /// Tasks that panicked or were cancelled before reporting an outcome
    pub aborted: u64,
}

impl BatchReport {
    /// Starts a report for `submitted` seed URLs
    pub fn start(submitted: u64) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            submitted,
            persisted: 0,
            failures: HashMap::new(),
            aborted: 0,
        }
    }

    /// Records one task's terminal outcome
    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Persisted => self.persisted += 1,
            TaskOutcome::Failed(stage) => *self.failures.entry(stage).or_insert(0) += 1,
        }
    }

    /// Records a task that ended without an outcome
    pub fn record_aborted(&mut self) {
        self.aborted += 1;
    }

    /// Marks the batch finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of tasks that failed at `stage`
    pub fn failed_at(&self, stage: TaskStage) -> u64 {
        self.failures.get(&stage).copied().unwrap_or(0)
    }

    /// Total number of failed tasks
    pub fn total_failed(&self) -> u64 {
        self.failures.values().sum::<u64>() + self.aborted
    }

    /// Number of tasks with a terminal outcome
    pub fn completed(&self) -> u64 {
        self.persisted + self.total_failed()
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of submitted seeds that produced a record
    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            (self.persisted as f64 / self.submitted as f64) * 100.0
        }
    }
}

/// Prints a report to stdout
///
/// # Arguments
///
/// * `report` - The report to display
/// * `sink` - Name of the sink records were appended to
pub fn print_report(report: &BatchReport, sink: &str) {
    println!("=== Batch Report ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  Seeds submitted: {}", report.submitted);
    println!("  Records persisted: {}", report.persisted);
    println!("  Sink: {}", sink);
    println!();

    if report.total_failed() > 0 {
        println!("Failures by Stage:");
        for stage in TaskStage::ALL {
            let count = report.failed_at(stage);
            if count > 0 {
                println!("  {}: {}", stage, count);
            }
        }
        if report.aborted > 0 {
            println!("  aborted: {}", report.aborted);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} seeds produced a record)",
        report.success_rate(),
        report.persisted,
        report.submitted
    );
}
