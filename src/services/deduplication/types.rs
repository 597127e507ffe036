//! Deduplication relation and result types.

use crate::Result;
use crate::models::{CallRecord, CorrelatedGroup, Direction, Party};

/// The fields that identify one bidirectional connection.
///
/// The platform logs a two-way connection twice: once from the receiving
/// leg (`TERMINATING`) and once from the initiating leg (`ORIGINATING`).
/// Both copies share start time and called number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    /// Leg start time.
    pub start_time: String,
    /// Raw called number.
    pub called_number: String,
}

/// Connection key and direction read from one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegSignature {
    /// Connection identity.
    pub key: ConnectionKey,
    /// Leg direction.
    pub direction: Direction,
}

impl LegSignature {
    /// Reads the signature of a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record lacks its start time, called number or
    /// direction.
    pub fn of(record: &CallRecord) -> Result<Self> {
        Ok(Self {
            key: ConnectionKey {
                start_time: record.start_time()?.to_string(),
                called_number: record.number(Party::Called)?.to_string(),
            },
            direction: record.direction()?,
        })
    }
}

/// Returns whether `candidate` is the redundant originating copy of `kept`.
///
/// The relation is asymmetric: `kept` must be the `TERMINATING` leg and
/// `candidate` the `ORIGINATING` leg of the same connection.
#[must_use]
pub fn is_same_bidirectional_connection(kept: &LegSignature, candidate: &LegSignature) -> bool {
    kept.key == candidate.key
        && kept.direction == Direction::Terminating
        && candidate.direction == Direction::Originating
}

/// Result of deduplicating one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeduplicationResult {
    /// The surviving records, in their original order.
    pub group: CorrelatedGroup,
    /// Number of records removed.
    pub removed: usize,
}

/// Strategy for removing redundant legs from a single group.
///
/// Allows for different implementations with identical results.
pub trait Deduplicator: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Removes every record that is the originating copy of a terminating
    /// record in the same group.
    ///
    /// # Errors
    ///
    /// Returns an error if a record lacks a field the relation reads.
    fn deduplicate(&self, group: CorrelatedGroup) -> Result<DeduplicationResult>;
}
