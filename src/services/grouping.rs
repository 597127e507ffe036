//! Correlation grouping.
//!
//! Partitions flat CDR rows by correlation id and drops push-notification
//! noise rows.

use crate::Result;
use crate::models::{CallHistory, CallRecord};
use std::time::Instant;
use tracing::instrument;

/// Related reason the platform reports for push-notification retrieval legs.
pub const PUSH_NOTIFICATION_REASON: &str = "PushNotificationRetrieval";

/// Groups records into a [`CallHistory`].
#[derive(Debug, Clone)]
pub struct GroupingService {
    notification_reason: String,
}

impl GroupingService {
    /// Creates a grouping service using the default notification reason.
    #[must_use]
    pub fn new() -> Self {
        Self::with_notification_reason(PUSH_NOTIFICATION_REASON)
    }

    /// Creates a grouping service that drops rows with the given related reason.
    #[must_use]
    pub fn with_notification_reason(reason: impl Into<String>) -> Self {
        Self {
            notification_reason: reason.into(),
        }
    }

    /// Returns the related reason treated as noise.
    #[must_use]
    pub fn notification_reason(&self) -> &str {
        &self.notification_reason
    }

    /// Returns whether a record is notification noise.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no related reason.
    pub fn is_notification(&self, record: &CallRecord) -> Result<bool> {
        Ok(record.related_reason()? == self.notification_reason)
    }

    /// Groups records by correlation id, keeping input order within a group.
    ///
    /// # Errors
    ///
    /// Returns an error if a record lacks its related reason, or a kept
    /// record lacks its correlation id.
    #[instrument(skip(self, records), fields(operation = "group", records = records.len()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn group(&self, records: Vec<CallRecord>) -> Result<CallHistory> {
        let start = Instant::now();
        let mut history = CallHistory::new();
        let mut dropped = 0usize;

        for record in records {
            if self.is_notification(&record)? {
                dropped += 1;
                continue;
            }
            let correlation_id = record.correlation_id()?.to_string();
            history.push(correlation_id, record);
        }

        metrics::counter!("callflow_notifications_dropped_total").increment(dropped as u64);
        metrics::histogram!("callflow_stage_duration_ms", "stage" => "group")
            .record(start.elapsed().as_millis() as f64);

        tracing::debug!(
            groups = history.len(),
            kept = history.record_count(),
            dropped,
            "Grouped records by correlation id"
        );

        Ok(history)
    }
}

impl Default for GroupingService {
    fn default() -> Self {
        Self::new()
    }
}
