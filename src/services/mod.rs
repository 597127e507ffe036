//! Pipeline stages and the driver that chains them.
//!
//! Each stage consumes an owned [`crate::models::CallHistory`] and returns a
//! new one.

pub mod categorization;
pub mod deduplication;
pub mod grouping;
pub mod ordering;
mod pipeline;
mod stage;

pub use categorization::CategorizationService;
pub use deduplication::{DedupStrategy, DeduplicationConfig, DeduplicationService};
pub use grouping::{GroupingService, PUSH_NOTIFICATION_REASON};
pub use ordering::OrderingService;
pub use pipeline::{CallHistoryPipeline, PipelineOutput, PipelineSummary, process};
pub use stage::HistoryStage;
