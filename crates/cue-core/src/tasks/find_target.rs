//! FindTargetTask - 実行中にターゲットを探し直すタスク
//!
//! # モード（どちらか一方）
//! - **Single**: 1 つのルール。必要ならクリアしてから探す
//! - **Group**: N 個のルール。ルールごとに「最初の 1 体」だけを記録し、
//!   最後にターゲット一覧を結果で置き換える（長さは常に N、空きは `None`）
//!
//! start と毎 tick の両方で探すので、動く相手を追従できます。

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ids::{EntityId, TaskId};
use crate::domain::invocation::Invocation;
use crate::domain::realm::TaskRealm;
use crate::ports::{TargetingRule, World};
use crate::typed::{Task, TaskContext, TaskTiming};

/// Rule names as written in a skill description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetingSpec {
    Single { rule: String },
    Group { rules: Vec<String> },
}

impl TargetingSpec {
    pub fn rule_names(&self) -> Vec<&str> {
        match self {
            TargetingSpec::Single { rule } => vec![rule.as_str()],
            TargetingSpec::Group { rules } => rules.iter().map(String::as_str).collect(),
        }
    }
}

fn default_single_frame() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindTargetConfig {
    #[serde(flatten)]
    pub timing: TaskTiming,

    #[serde(flatten)]
    pub targeting: TargetingSpec,

    #[serde(default = "default_single_frame")]
    pub single_frame: bool,
}

/// Resolved rules.
#[derive(Clone)]
pub enum Targeting {
    Single(Arc<dyn TargetingRule>),
    Group(Vec<Arc<dyn TargetingRule>>),
}

impl fmt::Debug for Targeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Targeting::Single(_) => f.write_str("Single"),
            Targeting::Group(rules) => write!(f, "Group({})", rules.len()),
        }
    }
}

#[derive(Debug)]
pub struct FindTargetTask {
    id: TaskId,
    timing: TaskTiming,
    targeting: Targeting,
    single_frame: bool,
}

impl FindTargetTask {
    pub const KIND: &'static str = "find_target";

    pub fn new(id: TaskId, targeting: Targeting) -> Self {
        Self {
            id,
            timing: TaskTiming::default(),
            targeting,
            single_frame: true,
        }
    }

    pub fn with_timing(mut self, timing: TaskTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_single_frame(mut self, single_frame: bool) -> Self {
        self.single_frame = single_frame;
        self
    }

    fn find(&self, invocation: &mut Invocation, world: &dyn World) {
        match &self.targeting {
            Targeting::Single(rule) => {
                if rule.should_clear_targets() {
                    invocation.clear_targets();
                }
                rule.find_targets(invocation, world);
            }
            Targeting::Group(rules) => {
                let results: Vec<Option<EntityId>> = rules
                    .iter()
                    .map(|rule| {
                        if rule.should_clear_targets() {
                            invocation.clear_targets();
                        }
                        rule.find_targets(invocation, world);
                        invocation.first_target(world)
                    })
                    .collect();
                debug!(
                    task = %self.id,
                    invocation = %invocation.id(),
                    found = results.iter().filter(|r| r.is_some()).count(),
                    rules = results.len(),
                    "group targeting"
                );
                invocation.replace_targets(results);
            }
        }
    }
}

impl Task for FindTargetTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn timing(&self) -> TaskTiming {
        self.timing
    }

    fn realm(&self) -> TaskRealm {
        TaskRealm::ClientAndServer
    }

    fn is_single_frame(&self) -> bool {
        self.single_frame
    }

    fn on_start(&self, ctx: &mut TaskContext<'_>) {
        self.find(ctx.invocation, &*ctx.world);
    }

    fn on_tick(&self, ctx: &mut TaskContext<'_>, _delta: f32) {
        self.find(ctx.invocation, &*ctx.world);
    }

    fn describe(&self) -> String {
        "Find Target".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::InvocationId;
    use crate::impls::{FixedTargets, FnRule, InMemoryAssets, InMemoryWorld};
    use rstest::rstest;

    fn run_start(task: &FindTargetTask, inv: &mut Invocation, world: &mut InMemoryWorld) {
        let assets = InMemoryAssets::new();
        let mut ctx = TaskContext {
            invocation: inv,
            world,
            assets: &assets,
            pad: None,
        };
        task.on_start(&mut ctx);
    }

    #[test]
    fn single_rule_with_clear_replaces_previous_results() {
        let mut world = InMemoryWorld::new();
        let a = world.spawn("a");
        let b = world.spawn("b");

        // Alternates between a and b on every call.
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let rule = FnRule::new(true, move |inv: &mut Invocation, _: &dyn World| {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            inv.add_target(if n % 2 == 0 { a } else { b });
        });
        let task = FindTargetTask::new(TaskId::from_u128(1), Targeting::Single(Arc::new(rule)));

        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill");
        run_start(&task, &mut inv, &mut world);
        run_start(&task, &mut inv, &mut world);

        assert_eq!(inv.targets(), &[Some(b)]);
    }

    #[test]
    fn single_rule_without_clear_accumulates() {
        let mut world = InMemoryWorld::new();
        let a = world.spawn("a");
        let task = FindTargetTask::new(
            TaskId::from_u128(1),
            Targeting::Single(Arc::new(FixedTargets::new(vec![a]))),
        );

        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill");
        run_start(&task, &mut inv, &mut world);
        run_start(&task, &mut inv, &mut world);

        assert_eq!(inv.targets(), &[Some(a), Some(a)]);
    }

    #[rstest]
    #[case::all_found(true, true, true)]
    #[case::middle_missing(true, false, true)]
    #[case::none_found(false, false, false)]
    fn group_keeps_one_slot_per_rule(#[case] first: bool, #[case] second: bool, #[case] third: bool) {
        let mut world = InMemoryWorld::new();
        let entities: Vec<EntityId> = (0..3).map(|i| world.spawn(&format!("e{i}"))).collect();
        let found = [first, second, third];

        let rules: Vec<Arc<dyn TargetingRule>> = entities
            .iter()
            .zip(found)
            .map(|(e, hit)| {
                let list = if hit { vec![*e] } else { vec![] };
                Arc::new(FixedTargets::new(list).clearing()) as Arc<dyn TargetingRule>
            })
            .collect();
        let task = FindTargetTask::new(TaskId::from_u128(1), Targeting::Group(rules));

        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill");
        run_start(&task, &mut inv, &mut world);

        let expected: Vec<Option<EntityId>> = entities
            .iter()
            .zip(found)
            .map(|(e, hit)| hit.then_some(*e))
            .collect();
        assert_eq!(inv.targets(), expected.as_slice());
    }

    #[test]
    fn config_parses_both_modes() {
        let single: FindTargetConfig =
            serde_json::from_str(r#"{ "mode": "single", "rule": "nearest", "start_time": 0.2 }"#).unwrap();
        assert_eq!(single.targeting.rule_names(), vec!["nearest"]);
        assert!(single.single_frame);
        assert_eq!(single.timing.start_time, 0.2);

        let group: FindTargetConfig = serde_json::from_str(
            r#"{ "mode": "group", "rules": ["a", "b"], "single_frame": false }"#,
        )
        .unwrap();
        assert_eq!(group.targeting.rule_names(), vec!["a", "b"]);
        assert!(!group.single_frame);
    }
}
