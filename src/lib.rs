//! # Callflow
//!
//! Call history reconstruction from telephony call detail records.
//!
//! Callflow takes the flat CDR rows a calling platform reports, plus four
//! reference lists (contact center dial numbers, users, call queues and
//! platform phone numbers), and produces a de-duplicated, chronologically
//! ordered call history in which every party number is tagged with the role
//! it plays.
//!
//! ## Pipeline
//!
//! 1. **Group** rows by correlation id, dropping push-notification noise
//! 2. **Deduplicate** connections the platform logged once per direction
//! 3. **Order** each call's legs by start time
//! 4. **Categorize** calling and called numbers against the directory
//!
//! ## Example
//!
//! ```rust,ignore
//! use callflow::{CallHistoryPipeline, CallRecord, DialNumberEntry, ReferenceDirectory};
//!
//! let directory = ReferenceDirectory::new()
//!     .with_dial_numbers(vec![DialNumberEntry::new("5551234")]);
//! let pipeline = CallHistoryPipeline::new(directory);
//!
//! let output = pipeline.run(records)?;
//! println!("{}", output.summary);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;

// Re-exports for convenience
pub use config::{CallflowConfig, PipelineSettings};
pub use io::{DirectoryPaths, Format, HistorySink, RecordSource};
pub use models::{
    CallHistory, CallRecord, CorrelatedGroup, DialNumberEntry, Direction, Party, PartyRole,
    PhoneNumberEntry, QueueNumberEntry, RecordField, ReferenceDirectory, UserEntry,
};
pub use services::{
    CallHistoryPipeline, CategorizationService, DedupStrategy, DeduplicationService,
    GroupingService, HistoryStage, OrderingService, PipelineOutput, PipelineSummary, process,
};

/// Error type for callflow operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown format or strategy names, unparseable record files |
/// | `OperationFailed` | I/O errors, config parse errors, logging setup failures |
/// | `MissingField` | A record lacks a field a pipeline stage reads |
/// | `InvalidDirectory` | A reference list is not a list, or an entry is malformed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A format, strategy or log format name is not recognized
    /// - A record file cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - The config file cannot be parsed
    /// - CSV, JSON or YAML output cannot be written
    /// - The tracing subscriber cannot be installed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A record lacks a field a stage reads.
    ///
    /// Raised at the point of use, never defaulted:
    /// - Grouping reads `Related reason` and `Correlation ID`
    /// - Deduplication reads `Start time`, `Called number` and `Direction`
    /// - Ordering reads `Start time`
    /// - Categorization reads both party numbers, `User UUID` and `Direction`
    #[error("record {record} is missing field '{field}'")]
    MissingField {
        /// Report header of the missing field.
        field: &'static str,
        /// Correlation id of the record, or `<unknown>`.
        record: String,
    },

    /// A reference directory is malformed.
    ///
    /// Raised when:
    /// - A directory file holds neither an array nor the expected envelope
    /// - An entry does not match the expected shape
    /// - A phone number entry has a number but no owner type
    #[error("invalid {directory} directory: {reason}")]
    InvalidDirectory {
        /// The directory list.
        directory: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type alias for callflow operations.
pub type Result<T> = std::result::Result<T, Error>;
