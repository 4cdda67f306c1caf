//! Line-delimited JSON output
//!
//! Records are appended to `<namespace>_dtcs.jsonl` as they arrive. When the
//! run finishes the stream is folded into the aggregate `<namespace>_dtcs.json`
//! array, so the aggregate always matches what was durably written.

use crate::output::traits::{HarvestSummary, OutputResult, OutputSink};
use crate::output::HarvestRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonLinesSink {
    writer: BufWriter<File>,
    stream_path: PathBuf,
    aggregate_path: PathBuf,
}

impl JsonLinesSink {
    /// Creates (truncating) the line stream for `namespace` inside `directory`
    pub fn create(directory: &Path, namespace: &str) -> OutputResult<Self> {
        std::fs::create_dir_all(directory)?;
        let stream_path = directory.join(format!("{}_dtcs.jsonl", namespace));
        let aggregate_path = directory.join(format!("{}_dtcs.json", namespace));

        Ok(Self {
            writer: BufWriter::new(File::create(&stream_path)?),
            stream_path,
            aggregate_path,
        })
    }

    pub fn stream_path(&self) -> &Path {
        &self.stream_path
    }

    pub fn aggregate_path(&self) -> &Path {
        &self.aggregate_path
    }

    fn write_aggregate(&self) -> OutputResult<usize> {
        let reader = BufReader::new(File::open(&self.stream_path)?);
        let mut values = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            values.push(serde_json::from_str::<serde_json::Value>(&line)?);
        }

        let mut out = BufWriter::new(File::create(&self.aggregate_path)?);
        serde_json::to_writer_pretty(&mut out, &values)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(values.len())
    }
}

impl OutputSink for JsonLinesSink {
    fn push(&mut self, record: &HarvestRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self, _summary: &HarvestSummary) -> OutputResult<()> {
        self.writer.flush()?;
        let count = self.write_aggregate()?;
        tracing::info!(
            "Wrote {} records to {}",
            count,
            self.aggregate_path.display()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
