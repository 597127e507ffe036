//! Format adapters for record input and history output.
//!
//! Each format implements [`RecordSource`] and [`HistorySink`].

pub mod csv;
pub mod json;
pub mod yaml;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use super::traits::{HistorySink, RecordSource};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON (array, newline-delimited, or feed envelope).
    #[default]
    Json,
    /// YAML (sequence or document stream).
    Yaml,
    /// CSV with a header row.
    Csv,
}

impl Format {
    /// Returns all formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Json, Self::Yaml, Self::Csv]
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
        }
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("json" | "ndjson" | "jsonl") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("csv") => Ok(Self::Csv),
            Some(ext) => Err(Error::InvalidInput(format!(
                "Unsupported file extension: .{ext}"
            ))),
            None => Err(Error::InvalidInput(
                "Cannot determine format: file has no extension".to_string(),
            )),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" | "ndjson" | "jsonl" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            _ => {
                let known: Vec<&str> = Self::all().iter().map(Self::extension).collect();
                Err(Error::InvalidInput(format!(
                    "Unknown format: {s} (expected one of {})",
                    known.join(", ")
                )))
            },
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Creates a record source for the given format and reader.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed.
pub fn create_record_source<R: BufRead + 'static>(
    reader: R,
    format: Format,
) -> Result<Box<dyn RecordSource>> {
    match format {
        Format::Json => Ok(Box::new(json::JsonRecordSource::new(reader)?)),
        Format::Yaml => Ok(Box::new(yaml::YamlRecordSource::new(reader)?)),
        Format::Csv => Ok(Box::new(csv::CsvRecordSource::new(reader)?)),
    }
}

/// Creates a history sink for the given format and writer.
#[must_use]
pub fn create_history_sink<W: Write + 'static>(writer: W, format: Format) -> Box<dyn HistorySink> {
    match format {
        Format::Json => Box::new(json::JsonHistorySink::new(writer)),
        Format::Yaml => Box::new(yaml::YamlHistorySink::new(writer)),
        Format::Csv => Box::new(csv::CsvHistorySink::new(writer)),
    }
}
