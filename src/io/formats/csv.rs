//! CSV format adapter.
//!
//! Reads the platform's CDR report downloads and writes one row per leg.

use crate::io::traits::{HistorySink, RecordSource};
use crate::models::{CallRecord, CorrelatedGroup, RecordField};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

/// Byte order mark carried by report downloads.
const BOM: char = '\u{feff}';

/// Column holding the 1-based leg position within its group.
pub const LEG_COLUMN: &str = "Leg";

/// Prefix for a source column whose name collides with [`LEG_COLUMN`].
pub const SOURCE_COLUMN_PREFIX: &str = "Source ";

/// CSV record source.
///
/// The first row is the header row. Rows may be shorter or longer than the
/// header; missing trailing columns are absent from the record and extra
/// values are ignored.
pub struct CsvRecordSource<R: BufRead> {
    /// CSV reader.
    reader: csv::Reader<R>,
    /// Header row, BOM stripped.
    headers: Vec<String>,
}

impl<R: BufRead> CsvRecordSource<R> {
    /// Creates a new CSV record source.
    ///
    /// # Errors
    ///
    /// Returns an error if the header row cannot be read.
    pub fn new(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::OperationFailed {
                operation: "read_csv_headers".to_string(),
                cause: e.to_string(),
            })?
            .iter()
            .enumerate()
            .map(|(i, header)| {
                if i == 0 {
                    header.trim_start_matches(BOM).trim().to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();

        Ok(Self {
            reader: csv_reader,
            headers,
        })
    }

    /// Returns the header row.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: BufRead> RecordSource for CsvRecordSource<R> {
    fn next(&mut self) -> Result<Option<CallRecord>> {
        let mut row = csv::StringRecord::new();

        let has_row = self
            .reader
            .read_record(&mut row)
            .map_err(|e| Error::OperationFailed {
                operation: "read_csv".to_string(),
                cause: e.to_string(),
            })?;
        if !has_row {
            return Ok(None);
        }

        Ok(Some(CallRecord::from_fields(
            self.headers.iter().zip(row.iter()),
        )))
    }
}

/// CSV history sink.
///
/// Rows are buffered until [`HistorySink::finalize`] because the header is
/// the union of all record columns: the `Leg` column, the pipeline fields in
/// report order, then any other columns alphabetically. Party numbers are
/// rendered with their role tag.
pub struct CsvHistorySink<W: Write> {
    writer: csv::Writer<W>,
    rows: Vec<BTreeMap<String, String>>,
    extra_columns: BTreeSet<String>,
}

impl<W: Write> CsvHistorySink<W> {
    /// Creates a new CSV history sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        let csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        Self {
            writer: csv_writer,
            rows: Vec::new(),
            extra_columns: BTreeSet::new(),
        }
    }

    fn header(&self) -> Vec<String> {
        std::iter::once(LEG_COLUMN.to_string())
            .chain(RecordField::all().iter().map(|f| f.header().to_string()))
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }
}

impl<W: Write> HistorySink for CsvHistorySink<W> {
    fn write_group(&mut self, _correlation_id: &str, group: &CorrelatedGroup) -> Result<()> {
        for (index, record) in group.iter().enumerate() {
            let mut row = record.display_fields();
            if let Some(source_leg) = row.remove(LEG_COLUMN) {
                let mut key = format!("{SOURCE_COLUMN_PREFIX}{LEG_COLUMN}");
                while row.contains_key(&key) {
                    key.insert_str(0, SOURCE_COLUMN_PREFIX);
                }
                row.insert(key, source_leg);
            }
            for key in row.keys() {
                if RecordField::from_key(key).is_none() {
                    self.extra_columns.insert(key.clone());
                }
            }
            row.insert(LEG_COLUMN.to_string(), (index + 1).to_string());
            self.rows.push(row);
        }
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        let header = self.header();
        self.writer
            .write_record(&header)
            .map_err(|e| Error::OperationFailed {
                operation: "write_csv_headers".to_string(),
                cause: e.to_string(),
            })?;

        for row in &self.rows {
            self.writer
                .write_record(
                    header
                        .iter()
                        .map(|column| row.get(column).map_or("", String::as_str)),
                )
                .map_err(|e| Error::OperationFailed {
                    operation: "write_csv".to_string(),
                    cause: e.to_string(),
                })?;
        }

        self.writer.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_csv".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Party, PartyRole};
    use std::io::Cursor;

    #[test]
    fn test_read_report_with_bom() {
        let input = "\u{feff}Correlation ID,Start time,Direction,Related reason,Calling number,Called number,User UUID,Site\n\
                     C1, 2024-01-01T10:00:00Z ,TERMINATING,,100,200,u1,HQ\n";
        let mut source = CsvRecordSource::new(Cursor::new(input)).unwrap();
        assert_eq!(source.headers()[0], "Correlation ID");

        let record = source.next().unwrap().unwrap();
        assert_eq!(record.correlation_id().unwrap(), "C1");
        assert_eq!(record.start_time().unwrap(), "2024-01-01T10:00:00Z");
        assert_eq!(record.related_reason().unwrap(), "");
        assert_eq!(record.get("Site"), Some("HQ"));

        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_short_row_leaves_fields_absent() {
        let input = "Correlation ID,Start time,Direction\nC1,t\n";
        let mut source = CsvRecordSource::new(Cursor::new(input)).unwrap();
        let record = source.next().unwrap().unwrap();
        assert!(record.direction().is_err());
    }

    #[test]
    fn test_snake_case_headers_are_normalized() {
        let input = "correlation_id,start_time\nC1,t\n";
        let mut source = CsvRecordSource::new(Cursor::new(input)).unwrap();
        let record = source.next().unwrap().unwrap();
        assert_eq!(record.correlation_id().unwrap(), "C1");
    }

    #[test]
    fn test_write_rows_with_leg_and_tags() {
        let mut tagged = CallRecord::new()
            .with_field("Correlation ID", "C1")
            .with_field("Called number", "5551234")
            .with_field("Site", "HQ");
        tagged.annotate(Party::Called, PartyRole::WxccDialNumber);
        let plain = CallRecord::new().with_field("Correlation ID", "C1");
        let group = CorrelatedGroup::from_records(vec![tagged, plain]);

        let mut output = Vec::new();
        {
            let mut sink = CsvHistorySink::new(&mut output);
            sink.write_group("C1", &group).unwrap();
            Box::new(sink).finalize().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Leg,Correlation ID,Start time,Direction,Related reason,Calling number,Called number,User UUID,Site"
        );
        assert_eq!(lines[1], "1,C1,,,,,5551234 (WxCC Dial Number),,HQ");
        assert_eq!(lines[2], "2,C1,,,,,,,");
    }

    #[test]
    fn test_source_leg_column_is_kept_under_renamed_key() {
        let record = CallRecord::new()
            .with_field("Correlation ID", "C1")
            .with_field("Leg", "B")
            .with_field("Source Leg", "upstream");
        let group = CorrelatedGroup::from_records(vec![record]);

        let mut output = Vec::new();
        {
            let mut sink = CsvHistorySink::new(&mut output);
            sink.write_group("C1", &group).unwrap();
            Box::new(sink).finalize().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Leg,Correlation ID,Start time,Direction,Related reason,Calling number,Called number,User UUID,Source Leg,Source Source Leg"
        );
        assert_eq!(lines[1], "1,C1,,,,,,,upstream,B");
    }
}
