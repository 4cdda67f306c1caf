//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::extract::Section;
use crate::output::{DetailRecord, ErrorRecord};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new run for `namespace`
    ///
    /// # Arguments
    ///
    /// * `namespace` - Namespace being harvested
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, namespace: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and discovery counts
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        listing_pages: usize,
        detail_links: usize,
    ) -> StorageResult<()>;

    // ===== Records =====

    /// Stores a record with its sections and chunks in one transaction
    ///
    /// Returns the record ID.
    fn insert_record(&mut self, run_id: i64, record: &DetailRecord) -> StorageResult<i64>;

    /// Stores an error record
    fn insert_error(&mut self, run_id: i64, error: &ErrorRecord) -> StorageResult<()>;

    /// Sections of a record in page order, chunks included
    fn load_sections(&self, record_id: i64) -> StorageResult<Vec<Section>>;

    // ===== Statistics =====

    fn count_records(&self, run_id: i64) -> StorageResult<u64>;

    fn count_errors(&self, run_id: i64) -> StorageResult<u64>;
}
