//! Call history pipeline.
//!
//! Runs the four stages in order:
//!
//! ```text
//! records ─▶ group ─▶ deduplicate ─▶ order ─▶ categorize ─▶ history
//! ```
//!
//! Each stage consumes the previous history and returns a new one. The first
//! failing stage aborts the run.

use crate::Result;
use crate::config::PipelineSettings;
use crate::models::{CallHistory, CallRecord, PartyRole, ReferenceDirectory};
use crate::services::categorization::CategorizationService;
use crate::services::deduplication::{DeduplicationConfig, DeduplicationService};
use crate::services::grouping::GroupingService;
use crate::services::ordering::OrderingService;
use crate::services::stage::HistoryStage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Counts collected over one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// Records handed to the pipeline.
    pub records_in: usize,
    /// Records dropped as notification noise.
    pub notifications_dropped: usize,
    /// Correlated groups in the output.
    pub groups: usize,
    /// Originating legs removed as duplicates.
    pub legs_removed: usize,
    /// Records in the output.
    pub records_out: usize,
    /// Annotated party numbers per role.
    pub annotations: BTreeMap<PartyRole, usize>,
}

impl PipelineSummary {
    /// Total number of annotated party numbers.
    #[must_use]
    pub fn annotated(&self) -> usize {
        self.annotations.values().sum()
    }

    /// Returns a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} records in, {} notifications dropped, {} duplicate legs removed, \
             {} records in {} groups",
            self.records_in,
            self.notifications_dropped,
            self.legs_removed,
            self.records_out,
            self.groups
        );
        if !self.annotations.is_empty() {
            let roles: Vec<String> = self
                .annotations
                .iter()
                .map(|(role, count)| format!("{role}: {count}"))
                .collect();
            line.push_str(&format!(" ({})", roles.join(", ")));
        }
        line
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Final history and run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// The categorized call history.
    pub history: CallHistory,
    /// Counts collected during the run.
    pub summary: PipelineSummary,
}

/// Groups, deduplicates, orders and categorizes call records.
pub struct CallHistoryPipeline {
    grouping: GroupingService,
    deduplication: DeduplicationService,
    ordering: OrderingService,
    categorization: CategorizationService,
}

impl CallHistoryPipeline {
    /// Creates a pipeline with default settings over a directory.
    #[must_use]
    pub fn new(directory: impl Into<Arc<ReferenceDirectory>>) -> Self {
        Self::from_settings(&PipelineSettings::default(), directory)
    }

    /// Creates a pipeline from settings.
    #[must_use]
    pub fn from_settings(
        settings: &PipelineSettings,
        directory: impl Into<Arc<ReferenceDirectory>>,
    ) -> Self {
        Self {
            grouping: GroupingService::with_notification_reason(
                settings.notification_reason.clone(),
            ),
            deduplication: DeduplicationService::new(DeduplicationConfig::new(
                settings.dedup_strategy,
            )),
            ordering: OrderingService::new(),
            categorization: CategorizationService::new(directory),
        }
    }

    /// Returns the reference directory used for categorization.
    #[must_use]
    pub fn directory(&self) -> &ReferenceDirectory {
        self.categorization.directory()
    }

    /// Runs all stages and returns the history with a run summary.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage: a record missing a field
    /// a stage reads, or a malformed directory entry.
    #[instrument(skip(self, records), fields(operation = "pipeline", records = records.len()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn run(&self, records: Vec<CallRecord>) -> Result<PipelineOutput> {
        let start = Instant::now();
        let records_in = records.len();

        let history = Self::logged("group", self.grouping.group(records))?;
        let grouped = history.record_count();

        let history = Self::run_stage(&self.deduplication, history)?;
        let deduplicated = history.record_count();

        let history = Self::run_stage(&self.ordering, history)?;
        let history = Self::run_stage(&self.categorization, history)?;

        let summary = PipelineSummary {
            records_in,
            notifications_dropped: records_in - grouped,
            groups: history.len(),
            legs_removed: grouped - deduplicated,
            records_out: history.record_count(),
            annotations: history.role_counts(),
        };

        metrics::counter!("callflow_pipeline_runs_total").increment(1);
        metrics::histogram!("callflow_pipeline_duration_ms")
            .record(start.elapsed().as_millis() as f64);
        tracing::info!(
            records_in = summary.records_in,
            records_out = summary.records_out,
            groups = summary.groups,
            annotated = summary.annotated(),
            "Pipeline completed"
        );

        Ok(PipelineOutput { history, summary })
    }

    /// Runs all stages and returns only the history.
    ///
    /// # Errors
    ///
    /// See [`CallHistoryPipeline::run`].
    pub fn process(&self, records: Vec<CallRecord>) -> Result<CallHistory> {
        self.run(records).map(|output| output.history)
    }

    fn run_stage(stage: &dyn HistoryStage, history: CallHistory) -> Result<CallHistory> {
        Self::logged(stage.name(), stage.apply(history))
    }

    fn logged<T>(stage: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::error!(stage, error = %e, "Pipeline stage failed");
        }
        result
    }
}

/// Runs the pipeline with default settings.
///
/// # Errors
///
/// See [`CallHistoryPipeline::run`].
pub fn process(records: Vec<CallRecord>, directory: ReferenceDirectory) -> Result<CallHistory> {
    CallHistoryPipeline::new(directory).process(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DialNumberEntry, Party, UserEntry};
    use crate::services::deduplication::DedupStrategy;

    fn row(id: &str, start: &str, direction: &str, calling: &str, called: &str) -> CallRecord {
        CallRecord::new()
            .with_field("Correlation ID", id)
            .with_field("Start time", start)
            .with_field("Direction", direction)
            .with_field("Related reason", "")
            .with_field("Calling number", calling)
            .with_field("Called number", called)
            .with_field("User UUID", "u1")
    }

    #[test]
    fn test_dual_logged_connection_collapses_and_is_tagged() {
        let directory =
            ReferenceDirectory::new().with_dial_numbers(vec![DialNumberEntry::new("5551234")]);
        let pipeline = CallHistoryPipeline::new(directory);

        let output = pipeline
            .run(vec![
                row("C1", "t", "TERMINATING", "x", "5551234"),
                row("C1", "t", "ORIGINATING", "y", "5551234"),
            ])
            .unwrap();

        let group = output.history.get("C1").unwrap();
        assert_eq!(group.len(), 1);
        let kept = &group.records()[0];
        assert_eq!(kept.number(Party::Calling).unwrap(), "x");
        assert_eq!(
            kept.display_number(Party::Called).unwrap(),
            "5551234 (WxCC Dial Number)"
        );

        assert_eq!(output.summary.records_in, 2);
        assert_eq!(output.summary.legs_removed, 1);
        assert_eq!(output.summary.records_out, 1);
        assert_eq!(
            output.summary.annotations.get(&PartyRole::WxccDialNumber),
            Some(&1)
        );
    }

    #[test]
    fn test_summary_counts_noise() {
        let mut noise = row("C2", "t", "ORIGINATING", "a", "b");
        noise.set("Related reason", "PushNotificationRetrieval");

        let output = CallHistoryPipeline::new(ReferenceDirectory::new())
            .run(vec![noise, row("C1", "t", "ORIGINATING", "a", "b")])
            .unwrap();

        assert_eq!(output.summary.notifications_dropped, 1);
        assert_eq!(output.summary.groups, 1);
        assert_eq!(output.summary.annotated(), 0);
        assert!(output.summary.to_string().starts_with("2 records in"));
    }

    #[test]
    fn test_settings_are_applied() {
        let settings = PipelineSettings {
            notification_reason: "Noise".to_string(),
            dedup_strategy: DedupStrategy::Indexed,
        };
        let mut noise = row("C1", "t", "ORIGINATING", "a", "b");
        noise.set("Related reason", "Noise");

        let pipeline = CallHistoryPipeline::from_settings(&settings, ReferenceDirectory::new());
        let history = pipeline.process(vec![noise]).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_stage_failure_aborts() {
        let directory = ReferenceDirectory::new().with_users(vec![UserEntry::new("u1")]);
        let mut broken = row("C1", "t", "ORIGINATING", "a", "b");
        broken = CallRecord::from_fields(
            broken
                .fields()
                .filter(|(k, _)| *k != "User UUID")
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        );

        let err = CallHistoryPipeline::new(directory)
            .run(vec![broken])
            .unwrap_err();
        assert!(err.to_string().contains("User UUID"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_grouping_failure_is_logged_as_stage_failure() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let no_reason = CallRecord::new()
            .with_field("Correlation ID", "C1")
            .with_field("Start time", "t");
        let pipeline = CallHistoryPipeline::new(ReferenceDirectory::new());
        let result =
            tracing::subscriber::with_default(subscriber, || pipeline.run(vec![no_reason]));
        assert!(result.is_err());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("Pipeline stage failed"))
            .unwrap();
        assert!(line.contains("stage="));
        assert!(line.contains("group"));
        assert!(line.contains("Related reason"));
    }

    #[test]
    fn test_empty_input() {
        let history = process(Vec::new(), ReferenceDirectory::new()).unwrap();
        assert!(history.is_empty());
    }
}
