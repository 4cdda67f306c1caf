//! CSV exports
//!
//! Three shapes are written for a namespace:
//! - `<ns>_dtcs_with_hex.csv`: one wide row per record
//! - `<ns>_dtcs_sections_long.csv`: one row per paragraph, list item or table
//! - `tables/<ns>/<code>/table_<n>.csv`: each table chunk, numbered per code from 1

use crate::extract::Chunk;
use crate::output::traits::{HarvestSummary, OutputResult, OutputSink};
use crate::output::{DetailRecord, HarvestRecord};
use crate::TableData;
use csv::Writer;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

const WIDE_HEADERS: [&str; 8] = [
    "dtc",
    "base_code",
    "fmi_hex",
    "fmi_meaning",
    "hex_triplet",
    "definition",
    "url",
    "error",
];

const LONG_HEADERS: [&str; 5] = ["dtc", "section_title", "order_index", "kind", "text"];

pub struct CsvSink {
    wide: Writer<File>,
    long: Writer<File>,
    directory: PathBuf,
    namespace: String,
    table_counts: HashMap<String, usize>,
}

impl CsvSink {
    pub fn create(directory: &Path, namespace: &str) -> OutputResult<Self> {
        std::fs::create_dir_all(directory)?;

        let mut wide = Writer::from_path(directory.join(format!("{}_dtcs_with_hex.csv", namespace)))?;
        wide.write_record(WIDE_HEADERS)?;
        wide.flush()?;

        let mut long =
            Writer::from_path(directory.join(format!("{}_dtcs_sections_long.csv", namespace)))?;
        long.write_record(LONG_HEADERS)?;
        long.flush()?;

        Ok(Self {
            wide,
            long,
            directory: directory.to_path_buf(),
            namespace: namespace.to_string(),
            table_counts: HashMap::new(),
        })
    }

    /// Directory receiving the table files of `code`, relative to the output directory
    fn table_dir(&self, code: &str) -> PathBuf {
        Path::new("tables")
            .join(&self.namespace)
            .join(file_safe(code))
    }

    fn write_detail(&mut self, record: &DetailRecord) -> OutputResult<()> {
        let triplet = record
            .canonical_triplet
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.wide.write_record([
            record.code.as_str(),
            record.base_code.as_deref().unwrap_or(""),
            record.fault_suffix.as_deref().unwrap_or(""),
            record.fault_meaning.as_deref().unwrap_or(""),
            triplet.as_str(),
            record.definition.as_deref().unwrap_or(""),
            record.url.as_str(),
            "",
        ])?;

        for section in &record.sections {
            let order_index = section.order_index.to_string();
            for chunk in &section.chunks {
                match chunk {
                    Chunk::Paragraph { text } => {
                        self.write_long(record, &section.title, &order_index, "paragraph", text)?;
                    }
                    Chunk::ListBlock { items } => {
                        for item in items {
                            self.write_long(record, &section.title, &order_index, "list_item", item)?;
                        }
                    }
                    Chunk::Table(table) => {
                        let path = self.write_table(&record.code, table)?;
                        let pointer = path.to_string_lossy().replace('\\', "/");
                        self.write_long(record, &section.title, &order_index, "table", &pointer)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn write_long(
        &mut self,
        record: &DetailRecord,
        title: &str,
        order_index: &str,
        kind: &str,
        text: &str,
    ) -> OutputResult<()> {
        self.long
            .write_record([record.code.as_str(), title, order_index, kind, text])?;
        Ok(())
    }

    /// Writes one table and returns its path relative to the output directory
    fn write_table(&mut self, code: &str, table: &TableData) -> OutputResult<PathBuf> {
        let relative_dir = self.table_dir(code);
        std::fs::create_dir_all(self.directory.join(&relative_dir))?;

        let index = self.table_counts.entry(code.to_string()).or_insert(0);
        *index += 1;
        let relative = relative_dir.join(format!("table_{}.csv", index));

        let mut writer = Writer::from_path(self.directory.join(&relative))?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(relative)
    }
}

impl OutputSink for CsvSink {
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()> {
        match record {
            HarvestRecord::Detail(detail) => self.write_detail(detail)?,
            HarvestRecord::Error(error) => {
                self.wide
                    .write_record(["", "", "", "", "", "", error.url.as_str(), error.error.as_str()])?;
            }
        }
        self.wide.flush()?;
        self.long.flush()?;
        Ok(())
    }

    fn finish(&mut self, summary: &HarvestSummary) -> OutputResult<()> {
        self.wide.flush()?;
        self.long.flush()?;
        let tables: usize = self.table_counts.values().sum();
        tracing::info!(
            "CSV output for {} written to {} ({} tables)",
            summary.namespace,
            self.directory.display(),
            tables
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Replaces path separators and other characters unsafe in file names
fn file_safe(code: &str) -> String {
    let safe: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    match safe.trim_matches('.') {
        "" => "UNKNOWN".to_string(),
        trimmed => trimmed.to_string(),
    }
}
