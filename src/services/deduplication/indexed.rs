//! Index-based deduplication.

use crate::Result;
use crate::models::{CorrelatedGroup, Direction};
use std::collections::HashSet;

use super::types::{ConnectionKey, DeduplicationResult, Deduplicator, LegSignature};

/// Indexes the terminating legs of a group by connection key, then drops the
/// originating legs that hit the index.
///
/// Linear in group size and equivalent to [`super::PairwiseDeduplicator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedDeduplicator;

impl IndexedDeduplicator {
    /// Creates a new indexed deduplicator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Deduplicator for IndexedDeduplicator {
    fn name(&self) -> &'static str {
        "indexed"
    }

    fn deduplicate(&self, group: CorrelatedGroup) -> Result<DeduplicationResult> {
        let signatures = group
            .iter()
            .map(LegSignature::of)
            .collect::<Result<Vec<_>>>()?;

        let terminating: HashSet<&ConnectionKey> = signatures
            .iter()
            .filter(|sig| sig.direction == Direction::Terminating)
            .map(|sig| &sig.key)
            .collect();

        let mut kept = CorrelatedGroup::new();
        let mut removed = 0;
        for (record, sig) in group.into_iter().zip(&signatures) {
            if sig.direction == Direction::Originating && terminating.contains(&sig.key) {
                removed += 1;
            } else {
                kept.push(record);
            }
        }

        Ok(DeduplicationResult {
            group: kept,
            removed,
        })
    }
}
