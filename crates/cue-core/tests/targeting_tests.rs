//! Targeting integration tests
//!
//! Single-rule refresh and group targeting through the runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cue_core::app::Runtime;
use cue_core::domain::{EntityId, Invocation, InvocationId, TaskId};
use cue_core::impls::{FixedTargets, FnRule, InMemoryAssets, InMemoryWorld};
use cue_core::ports::{TargetingRule, World};
use cue_core::tasks::{FindTargetTask, Targeting};
use cue_core::typed::Task;
use proptest::prelude::*;

fn run_once(task: &FindTargetTask, invocation: &mut Invocation, world: &mut InMemoryWorld) {
    let runtime = Runtime::with_default_pads(1).unwrap();
    let assets = InMemoryAssets::new();
    runtime.start(task, invocation, world, &assets);
    runtime.end(task, invocation, world, &assets, cue_core::domain::TaskResult::Successful);
}

#[test]
fn clearing_rule_replaces_previous_results() {
    let mut world = InMemoryWorld::new();
    let first = world.spawn("first");
    let second = world.spawn("second");
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let rule = FnRule::new(true, move |inv: &mut Invocation, _: &dyn World| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        inv.add_target(if n == 0 { first } else { second });
    });
    let task = FindTargetTask::new(TaskId::from_u128(1), Targeting::Single(Arc::new(rule)))
        .with_single_frame(false);

    let runtime = Runtime::with_default_pads(1).unwrap();
    let assets = InMemoryAssets::new();
    let mut inv = Invocation::new(InvocationId::from_u128(1), "find");

    runtime.start(&task, &mut inv, &mut world, &assets);
    assert_eq!(inv.targets(), &[Some(first)]);

    runtime.tick(&task, &mut inv, &mut world, &assets, 0.1);
    assert_eq!(inv.targets(), &[Some(second)]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn non_clearing_rule_accumulates() {
    let mut world = InMemoryWorld::new();
    let foe = world.spawn("foe");
    let task = FindTargetTask::new(
        TaskId::from_u128(1),
        Targeting::Single(Arc::new(FixedTargets::new(vec![foe]))),
    );
    let mut inv = Invocation::new(InvocationId::from_u128(1), "find");

    run_once(&task, &mut inv, &mut world);
    run_once(&task, &mut inv, &mut world);
    assert_eq!(inv.targets(), &[Some(foe), Some(foe)]);
}

#[test]
fn group_keeps_empty_slots_in_rule_order() {
    let mut world = InMemoryWorld::new();
    let a = world.spawn("a");
    let gone = world.spawn("gone");
    let c = world.spawn("c");
    world.despawn(gone);

    let rules: Vec<Arc<dyn TargetingRule>> = vec![
        Arc::new(FixedTargets::new(vec![a]).clearing()),
        Arc::new(FixedTargets::new(vec![]).clearing()),
        Arc::new(FixedTargets::new(vec![gone]).clearing()),
        Arc::new(FixedTargets::new(vec![c]).clearing()),
    ];
    let task = FindTargetTask::new(TaskId::from_u128(1), Targeting::Group(rules));
    let mut inv = Invocation::new(InvocationId::from_u128(1), "find");
    inv.add_target(gone);

    run_once(&task, &mut inv, &mut world);
    assert_eq!(inv.targets(), &[Some(a), None, None, Some(c)]);
    assert!(task.is_single_frame());
}

proptest! {
    #[test]
    fn group_targeting_has_one_slot_per_rule(found in prop::collection::vec(any::<bool>(), 1..12)) {
        let mut world = InMemoryWorld::new();
        let mut expected: Vec<Option<EntityId>> = Vec::new();
        let mut rules: Vec<Arc<dyn TargetingRule>> = Vec::new();

        for (i, hit) in found.iter().enumerate() {
            if *hit {
                let e = world.spawn(&format!("e{i}"));
                rules.push(Arc::new(FixedTargets::new(vec![e]).clearing()));
                expected.push(Some(e));
            } else {
                rules.push(Arc::new(FixedTargets::new(vec![]).clearing()));
                expected.push(None);
            }
        }

        let task = FindTargetTask::new(TaskId::from_u128(1), Targeting::Group(rules));
        let mut inv = Invocation::new(InvocationId::from_u128(1), "find");
        run_once(&task, &mut inv, &mut world);

        prop_assert_eq!(inv.targets().len(), found.len());
        prop_assert_eq!(inv.targets(), expected.as_slice());
    }
}
