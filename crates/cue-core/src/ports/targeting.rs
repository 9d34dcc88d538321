//! TargetingRule port - ターゲット探索ロジック
//!
//! 幾何・フィルタのアルゴリズムは外部の責務。タスクは「いつ呼ぶか」と
//! 「結果をどうまとめるか」だけを決めます。

use crate::domain::invocation::Invocation;
use crate::ports::World;

pub trait TargetingRule: Send + Sync {
    /// Whether the invocation's targets are cleared before this rule runs.
    fn should_clear_targets(&self) -> bool;

    /// Appends found entities to the invocation's target list.
    fn find_targets(&self, invocation: &mut Invocation, world: &dyn World);
}
