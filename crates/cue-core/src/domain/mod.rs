//! Domain model (IDs, invocations, assets, parameters, outcomes, ...).
//!
//! - ids / realm / outcome: 小さな値型
//! - asset / params / math: 再生・回転に必要な記述子
//! - invocation: スキル 1 回分のタイムライン（スケジューラが所有）
//! - errors: タスク実行中の失敗の分類

pub mod ids;
pub mod realm;
pub mod outcome;
pub mod asset;
pub mod params;
pub mod math;
pub mod target;
pub mod invocation;
pub mod errors;

pub use self::ids::{ComponentId, EntityId, Id, IdMarker, InvocationId, TaskId};
pub use self::realm::{NetworkRealm, TaskRealm};
pub use self::outcome::TaskResult;
pub use self::asset::{
    AnimationAsset, AssetHandle, ClipAsset, CompositeAsset, CompositeSection, SharedAsset,
};
pub use self::params::{AlphaBlend, BlendTimes, ParamValue, PlaybackMode, VisibilityTick};
pub use self::math::{Rotator, Vec3};
pub use self::target::TargetKind;
pub use self::invocation::Invocation;
pub use self::errors::TaskError;
