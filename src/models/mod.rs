//! Data models for callflow.
//!
//! This module contains the core data structures shared by the pipeline and
//! the I/O layer.

mod directory;
mod history;
mod record;
mod role;

pub use directory::{
    DialNumberEntry, NumberOwner, PEOPLE_OWNER_TYPE, PhoneNumberEntry, QueueNumberEntry,
    ReferenceDirectory, UserEntry,
};
pub use history::{CallHistory, CorrelatedGroup};
pub use record::{CallRecord, Direction, Party, RecordField};
pub use role::{PartyRole, render_annotated};
