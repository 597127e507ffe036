//! Stage abstraction for history transforms.

use crate::Result;
use crate::models::CallHistory;

/// A pipeline stage that turns one call history into another.
///
/// Stages take ownership of their input and return a new history; nothing
/// is shared between the input and the output.
pub trait HistoryStage: Send + Sync {
    /// Short stage name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Applies the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if a record lacks a field the stage reads, or if
    /// reference data is malformed.
    fn apply(&self, history: CallHistory) -> Result<CallHistory>;
}
