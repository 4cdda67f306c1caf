//! SQLite-based output sink
//!
//! Records are written straight into the storage backend, one transaction
//! per detail record, under a run row opened when the sink is created.

use crate::output::traits::{HarvestSummary, OutputResult, OutputSink};
use crate::output::HarvestRecord;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use std::path::Path;

/// Sink writing records to a SQLite database
pub struct SqliteSink {
    storage: Box<dyn Storage>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a run for `namespace`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `namespace` - Namespace being harvested
    /// * `config_hash` - Hash of the configuration that started the run
    pub fn create(path: &Path, namespace: &str, config_hash: &str) -> OutputResult<Self> {
        let storage = SqliteStorage::new(path)?;
        Self::with_storage(Box::new(storage), namespace, config_hash)
    }

    /// Starts a run on an already opened storage backend
    pub fn with_storage(
        mut storage: Box<dyn Storage>,
        namespace: &str,
        config_hash: &str,
    ) -> OutputResult<Self> {
        let run_id = storage.create_run(namespace, config_hash)?;
        tracing::debug!("Opened run {} for namespace {}", run_id, namespace);
        Ok(Self { storage, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }
}

impl OutputSink for SqliteSink {
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()> {
        match record {
            HarvestRecord::Detail(detail) => {
                self.storage.insert_record(self.run_id, detail)?;
            }
            HarvestRecord::Error(error) => {
                self.storage.insert_error(self.run_id, error)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self, summary: &HarvestSummary) -> OutputResult<()> {
        let status = if summary.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        self.storage.finish_run(
            self.run_id,
            status,
            summary.listing_pages,
            summary.detail_links,
        )?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{DetailRecord, ErrorRecord};
    use tempfile::TempDir;

    #[test]
    fn test_push_and_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harvest.db");
        let mut sink = SqliteSink::create(&path, "Land-Rover", "cafe").unwrap();

        let detail = DetailRecord::new("P0300-00", None, "https://x.test/Land-Rover/P0300-00", vec![]);
        sink.push(&detail.into()).unwrap();
        sink.push(
            &ErrorRecord {
                url: "https://x.test/Land-Rover/P0301-00".to_string(),
                error: "HTTP 403".to_string(),
            }
            .into(),
        )
        .unwrap();

        let mut summary = HarvestSummary::new("Land-Rover");
        summary.listing_pages = 1;
        summary.detail_links = 2;
        summary.records = 1;
        summary.errors = 1;
        sink.finish(&summary).unwrap();

        let run_id = sink.run_id();
        let storage = sink.storage();
        assert_eq!(storage.count_records(run_id).unwrap(), 1);
        assert_eq!(storage.count_errors(run_id).unwrap(), 1);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.detail_links, 2);
        assert_eq!(run.config_hash, "cafe");
    }

    #[test]
    fn test_interrupted_run_status() {
        let dir = TempDir::new().unwrap();
        let mut sink = SqliteSink::create(&dir.path().join("h.db"), "Jaguar", "h").unwrap();

        let mut summary = HarvestSummary::new("Jaguar");
        summary.interrupted = true;
        sink.finish(&summary).unwrap();

        let run = sink.storage().get_run(sink.run_id()).unwrap();
        assert_eq!(run.status, RunStatus::Interrupted);
    }

    #[test]
    fn test_runs_accumulate_in_one_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.db");

        let first = SqliteSink::create(&path, "Land-Rover", "h").unwrap().run_id();
        let second = SqliteSink::create(&path, "Jaguar", "h").unwrap();

        assert!(second.run_id() > first);
        let latest = second.storage().get_latest_run().unwrap().unwrap();
        assert_eq!(latest.namespace, "Jaguar");
    }
}
