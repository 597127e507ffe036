//! YAML format adapter.
//!
//! Reads a sequence of records, or a document stream with one record per
//! document. Scalar values keep their literal text, so `+15551234` and
//! `0123` are not read as numbers.

use crate::io::traits::{HistorySink, RecordSource};
use crate::models::{CallRecord, CorrelatedGroup};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Record with scalar values as written. `None` is a YAML null.
type RawRecord = BTreeMap<String, Option<String>>;

fn from_raw(raw: Vec<RawRecord>) -> Vec<CallRecord> {
    raw.into_iter()
        .map(|fields| {
            CallRecord::from_fields(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, value.unwrap_or_default())),
            )
        })
        .collect()
}

/// YAML record source.
pub struct YamlRecordSource {
    /// Pre-parsed records.
    records: Vec<CallRecord>,
    /// Current index.
    index: usize,
}

impl YamlRecordSource {
    /// Creates a new YAML record source.
    ///
    /// Parses all documents upfront since YAML requires full parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML parsing fails.
    pub fn new<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| Error::OperationFailed {
                operation: "read_yaml".to_string(),
                cause: e.to_string(),
            })?;

        if content.trim().is_empty() {
            return Ok(Self {
                records: Vec::new(),
                index: 0,
            });
        }

        if let Ok(raw) = serde_yaml_ng::from_str::<Vec<RawRecord>>(&content) {
            return Ok(Self {
                records: from_raw(raw),
                index: 0,
            });
        }

        let stream: std::result::Result<Vec<RawRecord>, _> =
            serde_yaml_ng::Deserializer::from_str(&content)
                .map(RawRecord::deserialize)
                .collect();
        if let Ok(raw) = stream {
            return Ok(Self {
                records: from_raw(raw),
                index: 0,
            });
        }

        // Nested values: resolve every scalar and render it as text.
        if let Ok(records) = serde_yaml_ng::from_str::<Vec<CallRecord>>(&content) {
            return Ok(Self { records, index: 0 });
        }

        let mut records = Vec::new();
        for (doc_index, document) in serde_yaml_ng::Deserializer::from_str(&content).enumerate() {
            let record = CallRecord::deserialize(document).map_err(|e| {
                Error::InvalidInput(format!(
                    "Document {}: Failed to parse YAML: {e}",
                    doc_index + 1
                ))
            })?;
            records.push(record);
        }

        Ok(Self { records, index: 0 })
    }
}

impl RecordSource for YamlRecordSource {
    fn next(&mut self) -> Result<Option<CallRecord>> {
        let record = self.records.get(self.index).cloned();
        if record.is_some() {
            self.index += 1;
        }
        Ok(record)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.records.len())
    }
}

/// YAML history sink.
///
/// Writes the history as a mapping from correlation id to a sequence of
/// records. Each group is emitted as its own single-key mapping; the
/// concatenation is one mapping.
pub struct YamlHistorySink<W: Write> {
    writer: W,
    /// Number of groups written.
    count: usize,
}

impl<W: Write> YamlHistorySink<W> {
    /// Creates a new YAML history sink.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }
}

impl<W: Write> HistorySink for YamlHistorySink<W> {
    fn write_group(&mut self, correlation_id: &str, group: &CorrelatedGroup) -> Result<()> {
        let entry = BTreeMap::from([(correlation_id, group)]);
        serde_yaml_ng::to_writer(&mut self.writer, &entry).map_err(|e| {
            Error::OperationFailed {
                operation: "write_yaml".to_string(),
                cause: e.to_string(),
            }
        })?;
        self.count += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        if self.count == 0 {
            writeln!(self.writer, "{{}}").map_err(|e| Error::OperationFailed {
                operation: "write_yaml".to_string(),
                cause: e.to_string(),
            })?;
        }
        self.writer.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_yaml".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }
}
