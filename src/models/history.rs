//! Correlated call history.

use super::record::{CallRecord, Party};
use super::role::PartyRole;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// All legs the platform logged under one correlation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelatedGroup {
    records: Vec<CallRecord>,
}

impl CorrelatedGroup {
    /// Creates an empty group.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Creates a group from records, keeping their order.
    #[must_use]
    pub const fn from_records(records: Vec<CallRecord>) -> Self {
        Self { records }
    }

    /// Appends a record.
    pub fn push(&mut self, record: CallRecord) {
        self.records.push(record);
    }

    /// Returns the records in order.
    #[must_use]
    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, CallRecord> {
        self.records.iter()
    }

    /// Consumes the group, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<CallRecord> {
        self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the group holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<CallRecord> for CorrelatedGroup {
    fn from_iter<I: IntoIterator<Item = CallRecord>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

impl IntoIterator for CorrelatedGroup {
    type Item = CallRecord;
    type IntoIter = std::vec::IntoIter<CallRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a CorrelatedGroup {
    type Item = &'a CallRecord;
    type IntoIter = std::slice::Iter<'a, CallRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Call history keyed by correlation id.
///
/// Groups are kept ordered by correlation id so output is deterministic.
/// Each pipeline stage consumes a history and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallHistory {
    groups: BTreeMap<String, CorrelatedGroup>,
}

impl CallHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Appends a record to the group for `correlation_id`, creating it if needed.
    pub fn push(&mut self, correlation_id: impl Into<String>, record: CallRecord) {
        self.groups
            .entry(correlation_id.into())
            .or_default()
            .push(record);
    }

    /// Inserts or replaces a whole group.
    pub fn insert_group(&mut self, correlation_id: impl Into<String>, group: CorrelatedGroup) {
        self.groups.insert(correlation_id.into(), group);
    }

    /// Returns the group for a correlation id.
    #[must_use]
    pub fn get(&self, correlation_id: &str) -> Option<&CorrelatedGroup> {
        self.groups.get(correlation_id)
    }

    /// Returns whether a group exists for the correlation id.
    #[must_use]
    pub fn contains(&self, correlation_id: &str) -> bool {
        self.groups.contains_key(correlation_id)
    }

    /// Iterates over `(correlation id, group)` pairs in id order.
    pub fn groups(&self) -> btree_map::Iter<'_, String, CorrelatedGroup> {
        self.groups.iter()
    }

    /// Iterates over correlation ids in order.
    pub fn correlation_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Iterates over every record of every group.
    pub fn records(&self) -> impl Iterator<Item = &CallRecord> {
        self.groups.values().flat_map(CorrelatedGroup::iter)
    }

    /// Number of groups, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across all groups.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.values().map(CorrelatedGroup::len).sum()
    }

    /// Counts assigned roles across both party numbers of every record.
    #[must_use]
    pub fn role_counts(&self) -> BTreeMap<PartyRole, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records() {
            for party in Party::BOTH {
                if let Some(role) = record.role(party) {
                    *counts.entry(role).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Rebuilds the history by transforming each group.
    ///
    /// Stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map_groups<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str, CorrelatedGroup) -> Result<CorrelatedGroup>,
    {
        let mut groups = BTreeMap::new();
        for (correlation_id, group) in self.groups {
            let group = f(&correlation_id, group)?;
            groups.insert(correlation_id, group);
        }
        Ok(Self { groups })
    }
}

impl FromIterator<(String, CorrelatedGroup)> for CallHistory {
    fn from_iter<I: IntoIterator<Item = (String, CorrelatedGroup)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CallHistory {
    type Item = (String, CorrelatedGroup);
    type IntoIter = btree_map::IntoIter<String, CorrelatedGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
