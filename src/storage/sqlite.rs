//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::{Chunk, Section};
use crate::output::{DetailRecord, ErrorRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, namespace, started_at, finished_at, config_hash, status, listing_pages, detail_links";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let raw_status: String = row.get(5)?;
    let status = RunStatus::from_db_string(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown run status '{}'", raw_status).into(),
        )
    })?;

    Ok(RunRecord {
        id: row.get(0)?,
        namespace: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status,
        listing_pages: row.get(6)?,
        detail_links: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, namespace: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (namespace, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![namespace, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        listing_pages: usize,
        detail_links: usize,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, listing_pages = ?3, detail_links = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                listing_pages as i64,
                detail_links as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn insert_record(&mut self, run_id: i64, record: &DetailRecord) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO records (run_id, code, base_code, fault_suffix, fault_meaning,
             canonical_triplet, definition, url, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                record.code,
                record.base_code,
                record.fault_suffix,
                record.fault_meaning,
                record.canonical_triplet.map(|t| t.to_string()),
                record.definition,
                record.url,
                record.fetched_at.to_rfc3339(),
            ],
        )?;
        let record_id = tx.last_insert_rowid();

        for section in &record.sections {
            tx.execute(
                "INSERT INTO sections (record_id, title, order_index) VALUES (?1, ?2, ?3)",
                params![record_id, section.title, section.order_index as i64],
            )?;
            let section_id = tx.last_insert_rowid();

            for (position, chunk) in section.chunks.iter().enumerate() {
                tx.execute(
                    "INSERT INTO chunks (section_id, position, kind, body) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        section_id,
                        position as i64,
                        chunk.kind(),
                        serde_json::to_string(chunk)?
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(record_id)
    }

    fn insert_error(&mut self, run_id: i64, error: &ErrorRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO errors (run_id, url, error, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, error.url, error.error, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_sections(&self, record_id: i64) -> StorageResult<Vec<Section>> {
        let mut section_stmt = self.conn.prepare(
            "SELECT id, title, order_index FROM sections WHERE record_id = ?1 ORDER BY order_index",
        )?;
        let mut chunk_stmt = self
            .conn
            .prepare("SELECT body FROM chunks WHERE section_id = ?1 ORDER BY position")?;

        let rows = section_stmt
            .query_map(params![record_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sections = Vec::with_capacity(rows.len());
        for (section_id, title, order_index) in rows {
            let bodies = chunk_stmt
                .query_map(params![section_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            let chunks = bodies
                .iter()
                .map(|body| serde_json::from_str::<Chunk>(body))
                .collect::<Result<Vec<_>, _>>()?;

            sections.push(Section {
                title,
                order_index: order_index as usize,
                chunks,
            });
        }

        Ok(sections)
    }

    // ===== Statistics =====

    fn count_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_errors(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM errors WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
