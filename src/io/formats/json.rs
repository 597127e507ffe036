//! JSON format adapter.
//!
//! Reads JSON arrays, newline-delimited JSON (NDJSON/JSONL) and the CDR
//! feed envelope `{"items": [...]}`.

use crate::io::traits::{HistorySink, RecordSource};
use crate::models::{CallRecord, CorrelatedGroup};
use crate::{Error, Result};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Envelope key of the CDR feed.
pub const FEED_ITEMS_KEY: &str = "items";

/// JSON record source.
///
/// The input is a stream of JSON values. Each value is one of:
/// - **Array**: every element is a record
/// - **Feed envelope**: an object whose `items` key holds an array of records
/// - **Object**: a single record (NDJSON has one per line)
pub struct JsonRecordSource {
    /// Parsed records.
    records: std::vec::IntoIter<CallRecord>,
    /// Total number of records.
    total: usize,
}

impl JsonRecordSource {
    /// Creates a new JSON record source.
    ///
    /// Parses the whole input upfront.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing fails.
    pub fn new<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| Error::OperationFailed {
                operation: "read_json".to_string(),
                cause: e.to_string(),
            })?;

        let mut records = Vec::new();
        let stream = serde_json::Deserializer::from_str(&content).into_iter::<Value>();
        for (index, value) in stream.enumerate() {
            let value = value.map_err(|e| {
                Error::InvalidInput(format!("Value {}: Failed to parse JSON: {e}", index + 1))
            })?;
            for item in Self::unwrap_envelope(value) {
                records.push(Self::parse_record(item)?);
            }
        }

        Ok(Self {
            total: records.len(),
            records: records.into_iter(),
        })
    }

    fn unwrap_envelope(value: Value) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            Value::Object(mut map) if map.get(FEED_ITEMS_KEY).is_some_and(Value::is_array) => {
                match map.remove(FEED_ITEMS_KEY) {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            },
            other => vec![other],
        }
    }

    fn parse_record(value: Value) -> Result<CallRecord> {
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse call record: {e}")))
    }
}

impl RecordSource for JsonRecordSource {
    fn next(&mut self) -> Result<Option<CallRecord>> {
        Ok(self.records.next())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// JSON history sink.
///
/// Writes the history as one object mapping correlation ids to arrays of
/// records, one group per line. Party numbers are rendered with their role
/// tag.
pub struct JsonHistorySink<W: Write> {
    writer: W,
    /// Number of groups written.
    count: usize,
}

impl<W: Write> JsonHistorySink<W> {
    /// Creates a new JSON history sink.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    fn io_error(e: &std::io::Error) -> Error {
        Error::OperationFailed {
            operation: "write_json".to_string(),
            cause: e.to_string(),
        }
    }
}

impl<W: Write> HistorySink for JsonHistorySink<W> {
    fn write_group(&mut self, correlation_id: &str, group: &CorrelatedGroup) -> Result<()> {
        let separator = if self.count == 0 { "{\n" } else { ",\n" };
        self.writer
            .write_all(separator.as_bytes())
            .map_err(|e| Self::io_error(&e))?;

        let encode_error = |e: serde_json::Error| Error::OperationFailed {
            operation: "write_json".to_string(),
            cause: e.to_string(),
        };
        serde_json::to_writer(&mut self.writer, correlation_id).map_err(encode_error)?;
        self.writer.write_all(b": ").map_err(|e| Self::io_error(&e))?;
        serde_json::to_writer(&mut self.writer, group).map_err(encode_error)?;

        self.count += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        let footer: &[u8] = if self.count == 0 { b"{}\n" } else { b"\n}\n" };
        self.writer
            .write_all(footer)
            .map_err(|e| Self::io_error(&e))?;
        self.writer.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_json".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }
}
