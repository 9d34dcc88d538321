//! Lifecycle integration tests
//!
//! Turn-to cleanup, restarts without an end, dynamic bindings, looping
//! duration floor and skills loaded from JSON.

use std::sync::Arc;

use cue_core::app::{Runtime, Skill, SkillBuilder, SkillSpec, TaskSpec, TimelineDriver};
use cue_core::domain::{
    AnimationAsset, AssetHandle, ClipAsset, Invocation, InvocationId, ParamValue, Rotator, TargetKind,
    TaskId, TaskResult, Vec3, VisibilityTick,
};
use cue_core::impls::{FixedTargets, InMemoryAssets, InMemoryWorld, PlaybackCall};
use cue_core::ports::{BindingResolver, PlaybackComponent};
use cue_core::tasks::{PlayAnimationConfig, PlayAnimationTask, TurnToConfig};
use cue_core::typed::{RuleRegistry, Task, TaskTiming};
use proptest::prelude::*;
use rstest::rstest;

fn run_clip(length: f32) -> InMemoryAssets {
    InMemoryAssets::new().with(AnimationAsset::Clip(ClipAsset {
        handle: AssetHandle::new("Run"),
        length,
    }))
}

fn driver(specs: Vec<TaskSpec>, rules: &RuleRegistry, assets: &InMemoryAssets, invocation: Invocation) -> TimelineDriver {
    let runtime = Arc::new(Runtime::with_default_pads(8).unwrap());
    let skill = specs
        .into_iter()
        .fold(SkillBuilder::new("lifecycle"), |b, s| b.task(s))
        .build(rules, assets, runtime.pool())
        .unwrap();
    TimelineDriver::new(runtime, Arc::new(skill), invocation)
}

#[rstest]
#[case::successful(TaskResult::Successful)]
#[case::interrupted(TaskResult::Interrupted)]
#[case::branch(TaskResult::BranchSegment)]
fn turn_in_place_is_cleared_on_every_end(#[case] result: TaskResult) {
    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    let foe = world.spawn("foe");
    world.place(foe, Vec3::new(0.0, 100.0, 0.0));
    world.add_turn_in_place(hero);
    let assets = InMemoryAssets::new();

    let config = TurnToConfig {
        timing: TaskTiming::new(0.0, 5.0),
        blend_time: 1.0,
        drive_turn_in_place: true,
        anim_turn_state: true,
        ..TurnToConfig::default()
    };
    let mut inv = Invocation::new(InvocationId::from_u128(1), "turn").with_self_entity(hero);
    inv.add_target(foe);
    let mut d = driver(vec![TaskSpec::TurnTo(config)], &RuleRegistry::new(), &assets, inv);

    d.begin(&mut world, &assets);
    d.advance(0.1, &mut world, &assets);
    let mid = world.turn_state(hero).unwrap();
    assert!(mid.can_turn);
    assert!(mid.rotate_on_spot);
    assert!(mid.direction != 0.0);

    d.stop(result, &mut world, &assets);
    let after = world.turn_state(hero).unwrap();
    assert!(!after.can_turn);
    assert!(!after.rotate_on_spot);
    assert_eq!(after.direction, 0.0);
}

fn single_task(spec: TaskSpec, assets: &InMemoryAssets) -> (Runtime, Skill) {
    let runtime = Runtime::with_default_pads(8).unwrap();
    let skill = SkillBuilder::new("restart")
        .task(spec)
        .build(&RuleRegistry::new(), assets, runtime.pool())
        .unwrap();
    (runtime, skill)
}

#[test]
fn restart_restores_visibility_tick_of_first_start() {
    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    let component = world.add_playback_component(hero).unwrap();
    let assets = run_clip(2.0);

    let mut config = PlayAnimationConfig::default().with_animation("Run");
    config.override_visibility_tick = true;
    config.visibility_tick = VisibilityTick::OnlyTickPoseWhenRendered;
    let (runtime, skill) = single_task(TaskSpec::PlayAnimation(config), &assets);
    let task = skill.tasks()[0].as_ref();
    let mut inv = Invocation::new(InvocationId::from_u128(1), "restart").with_self_entity(hero);

    runtime.start(task, &mut inv, &mut world, &assets);
    assert_eq!(
        world.playback_state(component).unwrap().visibility_tick(),
        VisibilityTick::OnlyTickPoseWhenRendered
    );

    runtime.start(task, &mut inv, &mut world, &assets);
    assert_eq!(
        world.playback_state(component).unwrap().visibility_tick(),
        VisibilityTick::OnlyTickPoseWhenRendered
    );

    runtime.end(task, &mut inv, &mut world, &assets, TaskResult::Interrupted);
    assert_eq!(
        world.playback_state(component).unwrap().visibility_tick(),
        VisibilityTick::AlwaysTickPoseAndRefreshBones
    );
}

#[test]
fn restart_clears_turn_flags_of_previous_targets() {
    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    let first = world.spawn("first");
    let second = world.spawn("second");
    world.place(first, Vec3::new(0.0, 100.0, 0.0));
    world.place(second, Vec3::new(100.0, 0.0, 0.0));
    world.add_turn_in_place(first);
    world.add_turn_in_place(second);
    let assets = InMemoryAssets::new();

    let config = TurnToConfig {
        timing: TaskTiming::new(0.0, 5.0),
        targets: vec![TargetKind::Targets],
        rotation_target: TargetKind::SelfEntity,
        blend_time: 1.0,
        drive_turn_in_place: true,
        anim_turn_state: true,
        ..TurnToConfig::default()
    };
    let (runtime, skill) = single_task(TaskSpec::TurnTo(config), &assets);
    let task = skill.tasks()[0].as_ref();
    let mut inv = Invocation::new(InvocationId::from_u128(1), "restart").with_self_entity(hero);
    inv.add_target(first);

    runtime.start(task, &mut inv, &mut world, &assets);
    runtime.tick(task, &mut inv, &mut world, &assets, 0.1);
    let turning = world.turn_state(first).unwrap();
    assert!(turning.can_turn);
    assert!(turning.rotate_on_spot);

    inv.clear_targets();
    inv.add_target(second);
    runtime.start(task, &mut inv, &mut world, &assets);
    let released = world.turn_state(first).unwrap();
    assert!(!released.can_turn);
    assert!(!released.rotate_on_spot);
    assert_eq!(released.direction, 0.0);
    assert!(world.turn_state(second).unwrap().can_turn);

    runtime.end(task, &mut inv, &mut world, &assets, TaskResult::Successful);
    for entity in [first, second] {
        let state = world.turn_state(entity).unwrap();
        assert!(!state.can_turn);
        assert!(!state.rotate_on_spot);
    }
}

#[test]
fn face_master_direction_uses_driver_without_sweep() {
    let mut world = InMemoryWorld::new();
    let pet = world.spawn("pet");
    let master = world.spawn("master");
    world.set_master(pet, master);
    world.set_root_rotation(master, Rotator::from_yaw(45.0));
    world.add_rotation_driver(pet);
    let assets = InMemoryAssets::new();

    let config = TurnToConfig {
        blend_time: 0.0,
        face_master_direction: true,
        ..TurnToConfig::default()
    };
    let inv = Invocation::new(InvocationId::from_u128(1), "turn").with_self_entity(pet);
    let mut d = driver(vec![TaskSpec::TurnTo(config)], &RuleRegistry::new(), &assets, inv);
    d.begin(&mut world, &assets);

    let driver_state = world.driver(pet).unwrap();
    assert_eq!(driver_state.last_sweep, Some(false));
    assert!(driver_state.rotation.unwrap().approx_eq(Rotator::from_yaw(45.0), 1e-3));
    assert_eq!(world.base_rotation_calls(pet), 0);
}

#[test]
fn bound_play_rate_overrides_static_value() {
    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    let component = world.add_playback_component(hero).unwrap();
    let assets = run_clip(2.0);

    let resolver: Arc<dyn BindingResolver> = Arc::new(|parameter: &str, _: &Invocation| -> Option<ParamValue> {
        (parameter == "play_rate").then_some(ParamValue::Float(1.5))
    });
    let runtime = Arc::new(Runtime::with_default_pads(8).unwrap());
    let skill = SkillBuilder::new("bound")
        .task(TaskSpec::PlayAnimation(PlayAnimationConfig::default().with_animation("Run")))
        .bind("play_rate", resolver)
        .unwrap()
        .build(&RuleRegistry::new(), &assets, runtime.pool())
        .unwrap();

    let inv = Invocation::new(InvocationId::from_u128(1), "bound").with_self_entity(hero);
    let mut d = TimelineDriver::new(runtime, Arc::new(skill), inv);
    d.begin(&mut world, &assets);

    let rates: Vec<f32> = world
        .playback_state(component)
        .unwrap()
        .calls()
        .iter()
        .filter_map(|c| match c {
            PlaybackCall::PlayClipAsComposite { rate, .. } => Some(*rate),
            _ => None,
        })
        .collect();
    assert_eq!(rates, vec![1.5]);
    assert!((d.skill().tasks()[0].end_time() - 2.0).abs() < 1e-5);
}

#[test]
fn skill_from_json_runs_to_completion() {
    let json = r#"{
        "name": "slash",
        "tasks": [
            { "type": "find_target", "mode": "single", "rule": "foe" },
            { "type": "turn_to", "blend_time": 0.0, "end_time": 0.2 },
            { "type": "play_animation", "animation": "Run", "targets": ["self_entity"] }
        ]
    }"#;
    let spec = SkillSpec::from_json(json).unwrap();

    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    let foe = world.spawn("foe");
    world.add_playback_component(hero).unwrap();
    let assets = run_clip(0.5);
    let mut rules = RuleRegistry::new();
    rules.register("foe", Arc::new(FixedTargets::new(vec![foe]).clearing())).unwrap();

    let runtime = Arc::new(Runtime::with_default_pads(8).unwrap());
    let skill = SkillBuilder::from_spec(spec)
        .build(&rules, &assets, runtime.pool())
        .unwrap();
    let inv = Invocation::new(InvocationId::from_u128(7), "slash").with_self_entity(hero);
    let mut d = TimelineDriver::new(runtime, Arc::new(skill), inv);

    d.begin(&mut world, &assets);
    for _ in 0..10 {
        d.advance(0.1, &mut world, &assets);
    }

    assert!(d.is_finished());
    let status = d.status();
    assert_eq!(status.counts.successful, 3);
    assert_eq!(status.targets, vec![Some(foe)]);
}

proptest! {
    #[test]
    fn looping_never_ends_before_configured_end(
        configured_end in 0.0f32..10.0,
        length in 0.1f32..5.0,
        rate in 0.25f32..4.0,
    ) {
        let mut config = PlayAnimationConfig::default()
            .with_animation("Run")
            .with_play_rate(rate)
            .with_timing(0.0, configured_end);
        config.looping = true;
        let mut task = PlayAnimationTask::new(TaskId::from_u128(1), config);
        task.resolve_assets(&run_clip(length));

        prop_assert!(task.end_time() >= configured_end);
    }
}
