//! Record sink implementations
//!
//! - `CsvSink`: append-only CSV file with a header written once on creation
//! - `MemorySink`: in-process collection, for dry runs and tests

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::record::{CompanyRecord, CSV_HEADER};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only CSV sink
///
/// The file is inspected once when the sink is opened: a missing or empty file
/// gets the header row before any record. Every append takes the writer lock,
/// writes a complete row and flushes, so concurrent tasks cannot interleave.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    /// Opens (or creates) the sink at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(CsvSink)` - Sink ready for appends
    /// * `Err(OutputError)` - The file or its parent directory is not writable
    pub fn open(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let needs_header = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
            tracing::debug!("Created sink {} with header", path.display());
        } else {
            tracing::debug!("Appending to existing sink {}", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn persist(&self, record: &CompanyRecord) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Poisoned(e.to_string()))?;
        writer.write_record(record.to_row())?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory sink that keeps records in append order
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<CompanyRecord>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records persisted so far
    pub fn records(&self) -> Vec<CompanyRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of records persisted so far
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Returns true if nothing has been persisted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn persist(&self, record: &CompanyRecord) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|e| OutputError::Poisoned(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
