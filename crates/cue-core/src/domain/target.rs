//! Which entities a task acts on.

use serde::{Deserialize, Serialize};

/// Source of the entities a task affects, resolved per call against the
/// invocation. Invalid entities are dropped at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The entity executing the skill.
    SelfEntity,

    /// The owner of the executing entity.
    Owner,

    /// Whoever caused the skill to run.
    Instigator,

    /// Every valid entry of the invocation's target list.
    Targets,
}

pub(crate) fn default_self() -> Vec<TargetKind> {
    vec![TargetKind::SelfEntity]
}
