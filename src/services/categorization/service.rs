//! Categorization stage.

use crate::Result;
use crate::models::{
    CallHistory, CallRecord, CorrelatedGroup, PartyRole, RecordField, ReferenceDirectory,
};
use crate::services::stage::HistoryStage;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use super::matchers::{Annotation, RoleMatcher, default_matchers};

/// Fields every record must carry, whether or not anything matches.
const REQUIRED_FIELDS: [RecordField; 4] = [
    RecordField::CallingNumber,
    RecordField::CalledNumber,
    RecordField::UserUuid,
    RecordField::Direction,
];

/// Annotates party numbers with roles inferred from the reference directory.
///
/// Matchers run in priority order (dial numbers, users, queues, phone
/// numbers). A party number keeps the first role it receives. Records are
/// never removed or reordered.
pub struct CategorizationService {
    directory: Arc<ReferenceDirectory>,
    matchers: Vec<Box<dyn RoleMatcher>>,
}

impl CategorizationService {
    /// Creates a categorization service over a directory.
    #[must_use]
    pub fn new(directory: impl Into<Arc<ReferenceDirectory>>) -> Self {
        Self {
            directory: directory.into(),
            matchers: default_matchers(),
        }
    }

    /// Returns the reference directory.
    #[must_use]
    pub fn directory(&self) -> &ReferenceDirectory {
        &self.directory
    }

    /// Categorizes a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record lacks a party number, user id or
    /// direction, or if a directory entry is malformed.
    pub fn categorize_record(&self, record: &mut CallRecord) -> Result<Vec<Annotation>> {
        for field in REQUIRED_FIELDS {
            record.field(field)?;
        }

        let mut applied = Vec::new();
        for matcher in &self.matchers {
            let annotations = matcher.categorize(record, &self.directory)?;
            if !annotations.is_empty() {
                tracing::trace!(
                    matcher = matcher.name(),
                    count = annotations.len(),
                    "Annotated party numbers"
                );
            }
            applied.extend(annotations);
        }
        Ok(applied)
    }

    /// Categorizes every record of the history.
    ///
    /// # Errors
    ///
    /// Returns an error if any record lacks a field the matchers read, or if
    /// a directory entry is malformed.
    #[instrument(
        skip(self, history),
        fields(operation = "categorize", groups = history.len())
    )]
    #[allow(clippy::cast_precision_loss)]
    pub fn categorize(&self, history: CallHistory) -> Result<CallHistory> {
        let start = Instant::now();
        let mut counts: BTreeMap<PartyRole, usize> = BTreeMap::new();

        let categorized = history.try_map_groups(|_, group| {
            let mut records = group.into_records();
            for record in &mut records {
                for annotation in self.categorize_record(record)? {
                    *counts.entry(annotation.role).or_default() += 1;
                }
            }
            Ok(CorrelatedGroup::from_records(records))
        })?;

        for (role, count) in &counts {
            metrics::counter!("callflow_annotations_total", "role" => role.as_str())
                .increment(*count as u64);
        }
        metrics::histogram!("callflow_stage_duration_ms", "stage" => "categorize")
            .record(start.elapsed().as_millis() as f64);

        tracing::debug!(
            annotated = counts.values().sum::<usize>(),
            "Categorized call history"
        );
        Ok(categorized)
    }
}

impl HistoryStage for CategorizationService {
    fn name(&self) -> &'static str {
        "categorize"
    }

    fn apply(&self, history: CallHistory) -> Result<CallHistory> {
        self.categorize(history)
    }
}
