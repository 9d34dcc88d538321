//! Tasks - 具体的なタスク実装
//!
//! - **FindTargetTask**: ターゲットの再探索（single / group）
//! - **TurnToTask**: 対象・主人の向きへ回転
//! - **PlayAnimationTask**: 3 つの再生バックエンドを持つアニメーション再生

pub mod find_target;
pub mod turn_to;
pub mod play_animation;

pub use self::find_target::{FindTargetConfig, FindTargetTask, Targeting, TargetingSpec};
pub use self::turn_to::{TurnToConfig, TurnToScratchPad, TurnToTask};
pub use self::play_animation::{
    AnimationMode, PlayAnimationConfig, PlayAnimationScratchPad, PlayAnimationTask,
    UNBOUNDED_LOOPS,
};
