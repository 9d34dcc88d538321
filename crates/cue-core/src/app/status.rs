//! Status - invocation の状態スナップショット
//!
//! CLI の出力やログ用。serde でそのまま JSON にできます。

use serde::{Deserialize, Serialize};

use crate::domain::ids::{EntityId, InvocationId, TaskId};
use crate::domain::outcome::TaskResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub active: usize,
    pub successful: usize,
    pub interrupted: usize,
    pub branched: usize,
    pub stopped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndedTask {
    pub task: TaskId,
    pub result: TaskResult,
}

/// Status はある時点の invocation を説明
///
/// # 使用例
/// ```ignore
/// let status = driver.status();
/// println!("{}", serde_json::to_string_pretty(&status)?);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub skill: String,
    pub invocation: InvocationId,
    pub time: f32,
    pub finished: bool,
    pub counts: TaskCounts,
    pub ended: Vec<EndedTask>,
    pub targets: Vec<Option<EntityId>>,
}

impl TaskCounts {
    pub fn tally(pending: usize, active: usize, ended: &[EndedTask]) -> Self {
        ended.iter().fold(
            Self {
                pending,
                active,
                ..Self::default()
            },
            |mut counts, e| {
                match e.result {
                    TaskResult::Successful => counts.successful += 1,
                    TaskResult::Interrupted => counts.interrupted += 1,
                    TaskResult::BranchSegment => counts.branched += 1,
                    TaskResult::StopAcross => counts.stopped += 1,
                }
                counts
            },
        )
    }
}
