//! Output sink trait and associated types
//!
//! A sink receives every record of a run in processing order and is told
//! when the run is over. Each `push` must be durable before it returns so an
//! interrupted run loses at most the record in flight.

use crate::output::HarvestRecord;
use crate::storage::StorageError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Accounting of one namespace run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestSummary {
    pub namespace: String,

    /// Listing pages fetched during discovery
    pub listing_pages: usize,

    /// Unique detail links discovered
    pub detail_links: usize,

    /// Detail records pushed
    pub records: usize,

    /// Error records pushed
    pub errors: usize,

    /// True if the run was cancelled before every link was processed
    pub interrupted: bool,

    pub elapsed: Duration,
}

impl HarvestSummary {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }

    /// Links that produced either a record or an error
    pub fn processed(&self) -> usize {
        self.records + self.errors
    }

    /// Every discovered link is accounted for
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.processed() == self.detail_links
    }
}

/// Streaming consumer of harvest records
///
/// Implementations are driven from one task at a time; `Send` lets a run
/// hold the sink across await points.
pub trait OutputSink: Send {
    /// Durably appends one record
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()>;

    /// Called once after the last push, also for interrupted runs
    fn finish(&mut self, summary: &HarvestSummary) -> OutputResult<()>;

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}

/// Sends every record to each inner sink, in order
///
/// The first failing sink aborts the push; later sinks do not see the record.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn OutputSink>>) -> Self {
        Self { sinks }
    }

    pub fn add(&mut self, sink: Box<dyn OutputSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for MultiSink {
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.push(record)?;
        }
        Ok(())
    }

    fn finish(&mut self, summary: &HarvestSummary) -> OutputResult<()> {
        // every sink gets a chance to close cleanly; the first error is reported
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish(summary) {
                tracing::error!("Failed to finish {} output: {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "multi"
    }
}
