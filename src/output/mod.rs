//! Output module for streaming harvest records
//!
//! This module handles:
//! - The `OutputSink` trait every destination implements
//! - JSON lines, CSV and SQLite sinks selected from configuration
//! - An in-memory sink for embedding and tests
//! - Printing the end-of-run summary

mod csv_output;
mod jsonl;
mod memory;
mod record;
mod sqlite_output;
mod summary;
mod traits;

pub use csv_output::CsvSink;
pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use record::{DetailRecord, ErrorRecord, HarvestRecord};
pub use sqlite_output::SqliteSink;
pub use summary::{format_summary, print_summary};
pub use traits::{HarvestSummary, MultiSink, OutputError, OutputResult, OutputSink};

use crate::config::{Config, OutputFormat};

/// Builds the sinks configured in `[output]` for one namespace
///
/// Each format appears at most once in the result, in the order first
/// listed. Creating a sink creates its files, so an unwritable directory
/// fails here rather than after the first fetch.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `namespace` - Namespace the sinks will receive records for
/// * `config_hash` - Hash of the configuration file, stored with SQLite runs
pub fn build_sinks(config: &Config, namespace: &str, config_hash: &str) -> OutputResult<MultiSink> {
    let directory = &config.output.directory;
    let mut multi = MultiSink::default();
    let mut seen = Vec::new();

    for format in &config.output.formats {
        if seen.contains(format) {
            continue;
        }
        seen.push(*format);

        let sink: Box<dyn OutputSink> = match format {
            OutputFormat::Jsonl => Box::new(JsonLinesSink::create(directory, namespace)?),
            OutputFormat::Csv => Box::new(CsvSink::create(directory, namespace)?),
            OutputFormat::Sqlite => Box::new(SqliteSink::create(
                &config.output.database_path(),
                namespace,
                config_hash,
            )?),
        };
        tracing::debug!("Writing {} output for {}", sink.name(), namespace);
        multi.add(sink);
    }

    Ok(multi)
}
