/// Task stage definitions for the per-URL pipeline
///
/// Every seed URL runs through the stages in declaration order; a task stops at
/// the first stage that fails.
use std::fmt;

/// A stage of the per-URL extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStage {
    /// Seed URL is checked before any network call
    Seed,

    /// Page is fetched over HTTP
    Fetch,

    /// Markup is reduced to a text corpus
    Reduce,

    /// The extraction collaborator guesses a company record
    Extract,

    /// The collaborator's text is read into a field mapping
    Parse,

    /// Domain-collision heuristics and schema checks
    Validate,

    /// The record is appended to the sink
    Persist,
}

impl TaskStage {
    /// All stages in pipeline order
    pub const ALL: [TaskStage; 7] = [
        Self::Seed,
        Self::Fetch,
        Self::Reduce,
        Self::Extract,
        Self::Parse,
        Self::Validate,
        Self::Persist,
    ];

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Fetch => "fetch",
            Self::Reduce => "reduce",
            Self::Extract => "extract",
            Self::Parse => "parse",
            Self::Validate => "validate",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a single seed URL's task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    /// A validated record was appended to the sink
    Persisted,

    /// The task stopped at the given stage
    Failed(TaskStage),
}

impl TaskOutcome {
    /// Returns true if a record was persisted
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Returns the stage the task failed at, if any
    pub fn failed_stage(&self) -> Option<TaskStage> {
        match self {
            Self::Persisted => None,
            Self::Failed(stage) => Some(*stage),
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted => f.write_str("persisted"),
            Self::Failed(stage) => write!(f, "failed at {}", stage),
        }
    }
}
