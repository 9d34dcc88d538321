//! TurnToTask - 対象の方向へエンティティを回すタスク
//!
//! # Lifecycle
//! - start: 対象ごとに (開始回転, 目標回転) を scratch pad に記録
//! - tick: `blend_time` かけて補間。必要ならその場旋回フラグと差分を更新
//! - end: 目標へスナップ（設定時）し、旋回フラグを必ず戻す
//!
//! 「主人と同じ向き」モードでは目的地を無視し、自分（または主人）の
//! 向きを目標にします。

use std::any::Any;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ids::{EntityId, TaskId};
use crate::domain::invocation::Invocation;
use crate::domain::math::Rotator;
use crate::domain::outcome::TaskResult;
use crate::domain::realm::TaskRealm;
use crate::domain::target::{TargetKind, default_self};
use crate::ports::World;
use crate::typed::{
    RegistryError, ScratchPad, ScratchPadPool, Task, TaskContext, TaskTiming, TypedScratchPad,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnToConfig {
    #[serde(flatten)]
    pub timing: TaskTiming,

    /// Entities that turn.
    pub targets: Vec<TargetKind>,

    /// Entity to face.
    pub rotation_target: TargetKind,

    /// Recompute the target rotation every tick.
    pub track_target: bool,

    /// Seconds to reach the target rotation; 0 snaps on start.
    pub blend_time: f32,

    pub use_yaw: bool,
    pub use_pitch: bool,
    pub rotation_offset: Rotator,
    pub set_target_on_end: bool,

    /// Raise the animation graph's "can turn" flag while active.
    pub anim_turn_state: bool,

    /// Drive in-place turning with the remaining yaw delta.
    pub drive_turn_in_place: bool,

    /// Face the same way as the controlling entity instead of a target.
    pub face_master_direction: bool,

    pub realm: TaskRealm,
}

impl Default for TurnToConfig {
    fn default() -> Self {
        Self {
            timing: TaskTiming::default(),
            targets: default_self(),
            rotation_target: TargetKind::Targets,
            track_target: false,
            blend_time: 0.2,
            use_yaw: true,
            use_pitch: false,
            rotation_offset: Rotator::ZERO,
            set_target_on_end: true,
            anim_turn_state: false,
            drive_turn_in_place: false,
            face_master_direction: false,
            realm: TaskRealm::ClientAndServer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnEntry {
    pub entity: EntityId,
    pub start: Rotator,
    pub target: Rotator,
}

#[derive(Debug, Default)]
pub struct TurnToScratchPad {
    pub in_progress: Vec<TurnEntry>,
}

impl ScratchPad for TurnToScratchPad {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn reset(&mut self) {
        self.in_progress.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedScratchPad for TurnToScratchPad {
    const KIND: &'static str = "turn_to";
}

#[derive(Debug)]
pub struct TurnToTask {
    id: TaskId,
    config: TurnToConfig,
}

impl TurnToTask {
    pub const KIND: &'static str = "turn_to";

    pub fn new(id: TaskId, config: TurnToConfig) -> Self {
        Self { id, config }
    }

    pub fn config(&self) -> &TurnToConfig {
        &self.config
    }

    /// Where `source` should end up facing, if anywhere.
    fn target_rotation(&self, invocation: &Invocation, world: &dyn World, source: EntityId) -> Option<Rotator> {
        if self.config.face_master_direction {
            return self.master_facing(world, source);
        }

        let current = world.rotation(source)?;
        let from = world.location(source)?;
        let destination = invocation
            .resolve_targets(&[self.config.rotation_target], world)
            .into_iter()
            .find(|e| *e != source)?;
        let to = world.location(destination)?;

        let look = Rotator::look_along(to.sub(from));
        let masked = Rotator::new(
            if self.config.use_pitch { look.pitch } else { current.pitch },
            if self.config.use_yaw { look.yaw } else { current.yaw },
            current.roll,
        );
        Some(masked.add(self.config.rotation_offset).normalized())
    }

    fn master_facing(&self, world: &dyn World, source: EntityId) -> Option<Rotator> {
        let own = world.body_rotation(source).or_else(|| world.rotation(source))?;
        match world.master(source).and_then(|m| world.rotation(m)) {
            Some(master) => Some(master),
            None => Some(own),
        }
    }

    fn apply_rotation(world: &mut dyn World, entity: EntityId, rotation: Rotator) {
        if let Some(driver) = world.rotation_driver(entity) {
            driver.set_rotation(rotation, false);
        } else {
            world.set_rotation(entity, rotation);
        }
    }

    fn alpha(&self, invocation: &Invocation) -> f32 {
        if self.config.blend_time <= 0.0 {
            return 1.0;
        }
        let started = invocation
            .task_start_time(self.id)
            .unwrap_or(self.config.timing.start_time);
        ((invocation.current_time() - started) / self.config.blend_time).clamp(0.0, 1.0)
    }
}

impl Task for TurnToTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn timing(&self) -> TaskTiming {
        self.config.timing
    }

    fn realm(&self) -> TaskRealm {
        self.config.realm
    }

    fn scratch_pad_kind(&self) -> Option<&'static str> {
        Some(TurnToScratchPad::KIND)
    }

    fn create_scratch_pad(
        &self,
        pool: &ScratchPadPool,
    ) -> Result<Option<Box<dyn ScratchPad>>, RegistryError> {
        pool.acquire::<TurnToScratchPad>().map(Some)
    }

    fn on_start(&self, ctx: &mut TaskContext<'_>) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<TurnToScratchPad>())
        else {
            return;
        };
        pad.in_progress.clear();

        for entity in ctx.invocation.resolve_targets(&self.config.targets, &*ctx.world) {
            let Some(start) = ctx.world.rotation(entity) else {
                continue;
            };
            let Some(target) = self.target_rotation(ctx.invocation, &*ctx.world, entity) else {
                debug!(task = %self.id, entity = %entity, "no rotation target");
                continue;
            };
            pad.in_progress.push(TurnEntry { entity, start, target });

            if self.config.blend_time <= 0.0 {
                Self::apply_rotation(ctx.world, entity, target);
            }
            if self.config.anim_turn_state
                && let Some(turn) = ctx.world.turn_in_place(entity)
            {
                turn.set_can_turn(true);
            }
        }
    }

    fn on_tick(&self, ctx: &mut TaskContext<'_>, _delta: f32) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<TurnToScratchPad>())
        else {
            return;
        };
        let alpha = self.alpha(ctx.invocation);

        for entry in pad.in_progress.iter_mut() {
            if !ctx.world.is_alive(entry.entity) {
                continue;
            }
            if self.config.track_target
                && let Some(target) = self.target_rotation(ctx.invocation, &*ctx.world, entry.entity)
            {
                entry.target = target;
            }

            if self.config.drive_turn_in_place
                && let Some(current) = ctx.world.rotation(entry.entity)
            {
                let delta_yaw = current.delta_yaw_to(entry.target);
                if let Some(turn) = ctx.world.turn_in_place(entry.entity) {
                    turn.set_rotate_on_spot(true);
                    turn.set_rotate_on_spot_direction(delta_yaw);
                }
            }

            Self::apply_rotation(ctx.world, entry.entity, entry.start.lerp_to(entry.target, alpha));
        }
    }

    fn on_end(&self, ctx: &mut TaskContext<'_>, result: TaskResult) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<TurnToScratchPad>())
        else {
            return;
        };

        for entry in &pad.in_progress {
            if !ctx.world.is_alive(entry.entity) {
                continue;
            }
            if self.config.set_target_on_end {
                Self::apply_rotation(ctx.world, entry.entity, entry.target);
            }
            if let Some(turn) = ctx.world.turn_in_place(entry.entity) {
                if self.config.anim_turn_state && turn.can_turn() {
                    turn.set_can_turn(false);
                }
                if self.config.drive_turn_in_place {
                    turn.set_rotate_on_spot(false);
                    turn.set_rotate_on_spot_direction(0.0);
                }
            }
        }
        debug!(task = %self.id, ?result, turned = pad.in_progress.len(), "turn finished");
        pad.in_progress.clear();
    }

    fn describe(&self) -> String {
        "Turn To".to_string()
    }
}
