//! Errors - タスク実行中の失敗の分類
//!
//! どれもホストにとって致命的ではありません。lifecycle の入口で
//! ログに出して「このターゲット / この効果をスキップ」に縮退します。

use thiserror::Error;

use super::asset::AssetHandle;
use super::ids::{ComponentId, EntityId, InvocationId, TaskId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// The invocation has already expired.
    #[error("invocation {0} is no longer valid")]
    InvalidInvocation(InvocationId),

    /// Tick or end without a prior start.
    #[error("no scratch pad for task {0}")]
    MissingScratchPad(TaskId),

    #[error("animation asset '{0}' could not be resolved")]
    UnresolvedAsset(AssetHandle),

    #[error("no animation asset configured")]
    NoAsset,

    #[error("section '{section}' does not exist in composite '{asset}'")]
    InvalidSectionName { asset: AssetHandle, section: String },

    #[error("{mode} mode cannot play '{asset}'")]
    UnsupportedModeForAssetType { mode: &'static str, asset: AssetHandle },

    #[error("entity {0} no longer exists")]
    StaleTarget(EntityId),

    #[error("playback component {0} no longer exists")]
    StaleComponent(ComponentId),

    #[error("no ability node in state machine '{state_machine}', state '{state}'")]
    NodeNotFound { state_machine: String, state: String },
}

impl TaskError {
    /// Stale references are expected between frames and are skipped silently.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            TaskError::MissingScratchPad(_) | TaskError::StaleTarget(_) | TaskError::StaleComponent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_references_are_silent() {
        assert!(TaskError::StaleTarget(EntityId::from_u128(1)).is_silent());
        assert!(!TaskError::UnresolvedAsset(AssetHandle::new("x")).is_silent());
    }

    #[test]
    fn messages_name_the_offender() {
        let e = TaskError::InvalidSectionName {
            asset: AssetHandle::new("Attack01"),
            section: "Nope".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Attack01"));
        assert!(msg.contains("Nope"));
    }
}
