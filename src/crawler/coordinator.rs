//! Batch coordinator - per-URL pipeline and bounded fan-out
//!
//! Each seed URL runs Fetch → Reduce → Extract → Parse → Validate → Persist as
//! one task. Tasks run concurrently up to the worker limit; a failing task is
//! logged at its failure point and counted, and never affects its siblings.

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::reducer::reduce_html;
use crate::extraction::{Extractor, OpenAiExtractor, ParseError};
use crate::output::{BatchReport, CsvSink, OutputError, RecordSink};
use crate::record::{CompanyRecord, RawPayload, ValidationError, Validator};
use crate::state::{TaskOutcome, TaskStage};
use crate::url::parse_web_url;
use crate::{HarvestError, UrlError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why a single task stopped
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid seed URL: {0}")]
    InvalidSeed(#[from] UrlError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("page reduced to an empty corpus")]
    EmptyCorpus,

    #[error("extraction produced no output")]
    ExtractionAbsent,

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Persist(#[from] OutputError),
}

impl TaskError {
    /// The pipeline stage the task stopped at
    pub fn stage(&self) -> TaskStage {
        match self {
            Self::InvalidSeed(_) => TaskStage::Seed,
            Self::Fetch(_) => TaskStage::Fetch,
            Self::EmptyCorpus => TaskStage::Reduce,
            Self::ExtractionAbsent => TaskStage::Extract,
            Self::Parse(_) => TaskStage::Parse,
            Self::Validation(_) => TaskStage::Validate,
            Self::Persist(_) => TaskStage::Persist,
        }
    }
}

/// Collaborators shared by every task of a batch
struct Pipeline {
    fetcher: Fetcher,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn RecordSink>,
    validator: Validator,
}

impl Pipeline {
    async fn process(&self, seed: &str) -> Result<CompanyRecord, TaskError> {
        let seed_url = parse_web_url(seed)?;

        let page = self.fetcher.fetch(seed_url.as_str()).await?;

        let reduced = reduce_html(&page);
        if reduced.text.is_empty() && reduced.links.is_empty() {
            return Err(TaskError::EmptyCorpus);
        }
        let corpus = reduced.to_corpus();
        tracing::debug!("Reduced {} to {} bytes of corpus", seed, corpus.len());

        let raw = self
            .extractor
            .extract(&corpus)
            .await
            .ok_or(TaskError::ExtractionAbsent)?;

        let payload = RawPayload::parse(&raw).map_err(|e| {
            tracing::debug!("Unparseable extraction output for {}: {}", seed, e.raw);
            TaskError::Parse(e)
        })?;

        let record = self.validator.validate(payload, seed)?;

        self.sink.persist(&record)?;

        Ok(record)
    }

    async fn run_task(&self, seed: &str) -> TaskOutcome {
        tracing::info!("Processing {}", seed);

        match self.process(seed).await {
            Ok(record) => {
                tracing::info!(
                    "Persisted {} from {}",
                    record.name.as_deref().unwrap_or("<unnamed>"),
                    seed
                );
                TaskOutcome::Persisted
            }
            Err(e) => {
                let stage = e.stage();
                tracing::error!("Task for {} failed at {}: {}", seed, stage, e);
                TaskOutcome::Failed(stage)
            }
        }
    }
}

/// Runs batches of seed URLs through the extraction pipeline
pub struct Coordinator {
    pipeline: Arc<Pipeline>,
    worker_limit: usize,
}

impl Coordinator {
    /// Creates a coordinator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Page fetcher shared by all tasks
    /// * `extractor` - Extraction collaborator
    /// * `sink` - Destination for validated records
    /// * `validator` - Validator with the configured host comparison
    /// * `worker_limit` - Maximum number of tasks in flight (at least 1)
    pub fn new(
        fetcher: Fetcher,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn RecordSink>,
        validator: Validator,
        worker_limit: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                fetcher,
                extractor,
                sink,
                validator,
            }),
            worker_limit: worker_limit.max(1),
        }
    }

    /// Builds a coordinator from configuration
    ///
    /// Opens the CSV sink and the chat-completions extractor. Any failure here
    /// is a setup failure and ends the run before a task is started.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(&config.user_agent, &config.fetcher)?;
        let extractor = OpenAiExtractor::from_config(&config.extraction)?;
        let sink = CsvSink::open(&config.output.sink_path)?;
        tracing::info!("Writing records to {}", sink.name());

        Ok(Self::new(
            fetcher,
            Arc::new(extractor),
            Arc::new(sink),
            Validator::new(config.validation.host_match),
            config.batch.worker_limit as usize,
        ))
    }

    /// Maximum number of concurrent tasks
    pub fn worker_limit(&self) -> usize {
        self.worker_limit
    }

    /// Runs one seed URL through the pipeline
    pub async fn process_seed(&self, seed: &str) -> Result<CompanyRecord, TaskError> {
        self.pipeline.process(seed).await
    }

    /// Runs every seed as an independent task, at most `worker_limit` at a time
    ///
    /// Individual task failures are logged and counted; they never end the
    /// batch. Rows land in the sink in completion order.
    pub async fn run_batch(&self, seeds: Vec<String>) -> BatchReport {
        let mut report = BatchReport::start(seeds.len() as u64);
        tracing::info!(
            "Starting batch of {} seed URL(s) with {} worker(s)",
            seeds.len(),
            self.worker_limit
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_limit));
        let mut tasks = JoinSet::new();

        for seed in seeds {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Worker pool closed before {} could start: {}", seed, e);
                    report.record_aborted();
                    continue;
                }
            };

            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn(async move {
                let outcome = pipeline.run_task(&seed).await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            Self::collect(&mut report, joined);
        }

        report.finish();
        tracing::info!(
            "Batch complete: {} persisted, {} failed of {} submitted",
            report.persisted,
            report.total_failed(),
            report.submitted
        );

        report
    }

    fn collect(
        report: &mut BatchReport,
        joined: Result<TaskOutcome, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                tracing::error!("Task ended without an outcome: {}", e);
                report.record_aborted();
            }
        }
    }
}
