//! Core traits for reading records and writing histories.
//!
//! Defines the [`RecordSource`] and [`HistorySink`] traits that format
//! adapters implement to support different file formats.

use crate::Result;
use crate::models::{CallHistory, CallRecord, CorrelatedGroup};

/// Source of call detail records.
///
/// Implementations read records from a specific format (JSON, YAML, CSV)
/// and yield them one at a time.
///
/// # Example Implementation
///
/// ```rust,ignore
/// impl RecordSource for JsonSource {
///     fn next(&mut self) -> Result<Option<CallRecord>> {
///         // Parse the next object, return a record
///     }
///
///     fn size_hint(&self) -> Option<usize> {
///         None // Unknown for streaming
///     }
/// }
/// ```
pub trait RecordSource {
    /// Reads the next record from the source.
    ///
    /// Returns `Ok(None)` when the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O errors occur.
    fn next(&mut self) -> Result<Option<CallRecord>>;

    /// Returns an estimate of the total number of records.
    ///
    /// Returns `None` if unknown.
    fn size_hint(&self) -> Option<usize> {
        None
    }

    /// Drains the source into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first read error.
    fn read_all(&mut self) -> Result<Vec<CallRecord>> {
        let mut records = Vec::with_capacity(self.size_hint().unwrap_or_default());
        while let Some(record) = self.next()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Sink for a finished call history.
///
/// # Lifecycle
///
/// 1. Create sink with output destination
/// 2. Call `write_group()` for each correlated group
/// 3. Call `finalize()` to complete the output
pub trait HistorySink {
    /// Writes one correlated group.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails.
    fn write_group(&mut self, correlation_id: &str, group: &CorrelatedGroup) -> Result<()>;

    /// Finalizes the output, writing any footers and flushing buffers.
    ///
    /// This method consumes the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// Writes every group of a history to a sink and finalizes it.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn write_history(mut sink: Box<dyn HistorySink>, history: &CallHistory) -> Result<usize> {
    let mut written = 0;
    for (correlation_id, group) in history.groups() {
        sink.write_group(correlation_id, group)?;
        written += group.len();
    }
    sink.finalize()?;
    Ok(written)
}
