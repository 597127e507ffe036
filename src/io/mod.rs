//! Record input, directory loading and history output.
//!
//! # Architecture
//!
//! - **Format adapters** implement [`RecordSource`] and [`HistorySink`]
//! - **Directory loaders** read the four reference lists into a
//!   [`crate::models::ReferenceDirectory`]
//!
//! # Supported Formats
//!
//! | Format | Records in | History out | Notes |
//! |--------|------------|-------------|-------|
//! | JSON | ✓ | ✓ | Array, NDJSON, or `{"items": [...]}` feed |
//! | YAML | ✓ | ✓ | Sequence or document stream |
//! | CSV | ✓ | ✓ | Report download with header row; one row per leg on output |
//!
//! # Examples
//!
//! ```rust,ignore
//! use callflow::io::{Format, create_record_source, create_history_sink, write_history};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let file = BufReader::new(File::open("cdr.csv")?);
//! let records = create_record_source(file, Format::Csv)?.read_all()?;
//! let history = pipeline.process(records)?;
//! write_history(create_history_sink(std::io::stdout(), Format::Json), &history)?;
//! ```

pub mod directory;
pub mod formats;
pub mod traits;

pub use directory::{DirectoryPaths, load_directory, load_list, parse_list};
pub use formats::{Format, create_history_sink, create_record_source};
pub use traits::{HistorySink, RecordSource, write_history};
