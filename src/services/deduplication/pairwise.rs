//! All-pairs deduplication.

use crate::Result;
use crate::models::CorrelatedGroup;

use super::types::{
    DeduplicationResult, Deduplicator, LegSignature, is_same_bidirectional_connection,
};

/// Compares every record of a group against every other record.
///
/// Quadratic in group size. Groups are typically one or two legs, rarely
/// more than a handful.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseDeduplicator;

impl PairwiseDeduplicator {
    /// Creates a new pairwise deduplicator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Deduplicator for PairwiseDeduplicator {
    fn name(&self) -> &'static str {
        "pairwise"
    }

    fn deduplicate(&self, group: CorrelatedGroup) -> Result<DeduplicationResult> {
        let signatures = group
            .iter()
            .map(LegSignature::of)
            .collect::<Result<Vec<_>>>()?;

        let mut kept = CorrelatedGroup::new();
        let mut removed = 0;
        for (record, candidate) in group.into_iter().zip(&signatures) {
            let redundant = signatures
                .iter()
                .any(|other| is_same_bidirectional_connection(other, candidate));
            if redundant {
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
