//! Append-only CSV output for joined rows.

use crate::error::{Error, Result};
use crate::types::OutputRow;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// CSV file the export appends to, one write per batch
///
/// The header is written only when the file is empty at the moment of writing, so
/// re-running an export against an existing file appends without a second header.
#[derive(Clone, Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Create a sink for the given path; nothing is opened until the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows, returning how many were written
    ///
    /// An empty slice is a no-op: the file is not opened or created.
    pub fn append(&self, rows: &[OutputRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(OutputRow::COLUMNS)?;
        }
        for row in rows {
            writer.write_record(row.to_record())?;
        }
        writer.flush()?;

        tracing::debug!(path = %self.path.display(), rows = rows.len(), header = needs_header, "appended rows");
        Ok(rows.len())
    }

    /// Append one batch of rows from async code
    ///
    /// The file work runs on the blocking pool; see [`CsvSink::append`].
    pub async fn append_batch(&self, rows: Vec<OutputRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sink = self.clone();
        tokio::task::spawn_blocking(move || sink.append(&rows))
            .await
            .map_err(|e| Error::Other(format!("CSV append task panicked: {}", e)))?
    }
}
