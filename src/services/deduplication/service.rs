//! Deduplication stage.

use crate::Result;
use crate::models::CallHistory;
use crate::services::stage::HistoryStage;
use std::time::Instant;
use tracing::instrument;

use super::config::DeduplicationConfig;
use super::types::Deduplicator;

/// Removes the originating copy of every dual-logged connection.
///
/// Groups that lose all their records stay in the history as empty groups.
pub struct DeduplicationService {
    config: DeduplicationConfig,
    deduplicator: Box<dyn Deduplicator>,
}

impl DeduplicationService {
    /// Creates a deduplication service.
    #[must_use]
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            deduplicator: config.strategy.build(),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DeduplicationConfig {
        &self.config
    }

    /// Deduplicates every group of the history.
    ///
    /// # Errors
    ///
    /// Returns an error if any record lacks its start time, called number or
    /// direction.
    #[instrument(
        skip(self, history),
        fields(
            operation = "deduplicate",
            strategy = %self.config.strategy,
            groups = history.len()
        )
    )]
    #[allow(clippy::cast_precision_loss)]
    pub fn deduplicate(&self, history: CallHistory) -> Result<CallHistory> {
        let start = Instant::now();
        let mut removed_total = 0usize;

        let deduplicated = history.try_map_groups(|correlation_id, group| {
            let result = self.deduplicator.deduplicate(group)?;
            if result.removed > 0 {
                tracing::trace!(
                    correlation_id,
                    removed = result.removed,
                    "Removed originating legs"
                );
            }
            removed_total += result.removed;
            Ok(result.group)
        })?;

        metrics::counter!(
            "callflow_legs_removed_total",
            "strategy" => self.config.strategy.as_str()
        )
        .increment(removed_total as u64);
        metrics::histogram!("callflow_stage_duration_ms", "stage" => "deduplicate")
            .record(start.elapsed().as_millis() as f64);

        tracing::debug!(removed = removed_total, "Deduplicated call history");
        Ok(deduplicated)
    }
}

impl Default for DeduplicationService {
    fn default() -> Self {
        Self::new(DeduplicationConfig::default())
    }
}

impl HistoryStage for DeduplicationService {
    fn name(&self) -> &'static str {
        "deduplicate"
    }

    fn apply(&self, history: CallHistory) -> Result<CallHistory> {
        self.deduplicate(history)
    }
}
