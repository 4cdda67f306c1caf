use crate::output::traits::{HarvestSummary, OutputResult, OutputSink};
use crate::output::HarvestRecord;
use std::sync::{Arc, Mutex};

/// Keeps every record in memory
///
/// Handles returned by [`MemorySink::records`] and [`MemorySink::finished`]
/// stay readable after the sink has been moved into a run.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<HarvestRecord>>>,
    finished: Arc<Mutex<Option<HarvestSummary>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Arc<Mutex<Vec<HarvestRecord>>> {
        Arc::clone(&self.records)
    }

    /// The summary passed to `finish`, once it has been called
    pub fn finished(&self) -> Arc<Mutex<Option<HarvestSummary>>> {
        Arc::clone(&self.finished)
    }

    /// Copy of the records pushed so far
    pub fn snapshot(&self) -> Vec<HarvestRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutputSink for MemorySink {
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &HarvestSummary) -> OutputResult<()> {
        let mut finished = match self.finished.lock() {
            Ok(finished) => finished,
            Err(poisoned) => poisoned.into_inner(),
        };
        *finished = Some(summary.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
