//! Why a task ended.

use serde::{Deserialize, Serialize};

/// The reason passed to `on_end`.
///
/// Cancellation is not a separate channel: an interrupted skill simply ends
/// its running tasks with an interruption-flavoured result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskResult {
    /// The task reached its end time.
    Successful,

    /// The owning skill was interrupted.
    Interrupted,

    /// The skill branched into another segment.
    BranchSegment,

    /// The skill was stopped across a branch (forced stop).
    StopAcross,
}

impl TaskResult {
    pub fn is_successful(self) -> bool {
        matches!(self, TaskResult::Successful)
    }
}
