//! Chronological ordering of call legs.

use crate::Result;
use crate::models::{CallHistory, CorrelatedGroup};
use crate::services::stage::HistoryStage;
use std::time::Instant;
use tracing::instrument;

/// Sorts the legs of every group by start time.
///
/// The sort is stable and compares start times as strings; the platform
/// reports them in a lexicographically sortable format.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderingService;

impl OrderingService {
    /// Creates an ordering service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Sorts one group. Ties keep their input order.
    ///
    /// # Errors
    ///
    /// Returns an error if a record has no start time.
    pub fn order_group(group: CorrelatedGroup) -> Result<CorrelatedGroup> {
        let mut keyed = group
            .into_iter()
            .map(|record| Ok((record.start_time()?.to_string(), record)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }

    /// Sorts every group of the history.
    ///
    /// # Errors
    ///
    /// Returns an error if a record has no start time.
    #[instrument(skip(self, history), fields(operation = "order", groups = history.len()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn order(&self, history: CallHistory) -> Result<CallHistory> {
        let start = Instant::now();
        let ordered = history.try_map_groups(|_, group| Self::order_group(group))?;

        metrics::histogram!("callflow_stage_duration_ms", "stage" => "order")
            .record(start.elapsed().as_millis() as f64);
        tracing::debug!(records = ordered.record_count(), "Ordered call history");

        Ok(ordered)
    }
}

impl HistoryStage for OrderingService {
    fn name(&self) -> &'static str {
        "order"
    }

    fn apply(&self, history: CallHistory) -> Result<CallHistory> {
        self.order(history)
    }
}
