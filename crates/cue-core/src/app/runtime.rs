//! Runtime - スケジューラからコアへの入口
//!
//! ホストのスケジューラは「いつ」呼ぶかだけを決め、ここを通して
//! タスクの lifecycle を呼び出します。Runtime が守ること:
//!
//! - scratch pad のスロットは start 中だけ存在する
//! - `end` は start 1 回につき 1 回（start していないタスクの end は無視）
//! - end せずに 2 回目の start が来たら、前回分を `Interrupted` で end して
//!   から既存の pad をリセットして使い回す
//! - 期限切れの invocation への呼び出しは警告を出して無視
//! - pad は呼び出しの間だけ invocation から取り出して `TaskContext` に貸す

use std::sync::Arc;

use tracing::{debug, warn};

use super::config::RuntimeConfig;
use crate::domain::errors::TaskError;
use crate::domain::invocation::Invocation;
use crate::domain::outcome::TaskResult;
use crate::domain::realm::TaskRealm;
use crate::ports::{AssetResolver, World};
use crate::tasks::{PlayAnimationScratchPad, TurnToScratchPad};
use crate::typed::{RegistryError, ScratchPad, ScratchPadPool, Task, TaskContext};

pub struct Runtime {
    pool: ScratchPadPool,
}

impl Runtime {
    pub fn new(pool: ScratchPadPool) -> Self {
        Self { pool }
    }

    /// A runtime whose pool knows every built-in pad kind.
    pub fn with_default_pads(capacity_per_kind: usize) -> Result<Self, RegistryError> {
        let mut pool = ScratchPadPool::new(capacity_per_kind);
        pool.register::<TurnToScratchPad>()?;
        pool.register::<PlayAnimationScratchPad>()?;
        Ok(Self::new(pool))
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RegistryError> {
        Self::with_default_pads(config.pool_capacity_per_kind)
    }

    pub fn pool(&self) -> &ScratchPadPool {
        &self.pool
    }

    pub fn start(
        &self,
        task: &dyn Task,
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
    ) {
        if expired(task, invocation, "start") {
            return;
        }
        let id = task.id();
        if invocation.is_started(id) {
            debug!(task = %id, invocation = %invocation.id(), "restart without end, undoing previous start");
            with_context(task, invocation, world, assets, |ctx| {
                task.on_end(ctx, TaskResult::Interrupted)
            });
            let mut pad = invocation.close_slot(id);
            if let Some(pad) = pad.as_deref_mut() {
                pad.reset();
            }
            invocation.open_slot(id, pad);
        } else {
            let pad = match task.create_scratch_pad(&self.pool) {
                Ok(pad) => pad,
                Err(e) => {
                    warn!(task = %id, kind = task.kind(), invocation = %invocation.id(), "cannot create scratch pad: {e}");
                    return;
                }
            };
            invocation.open_slot(id, pad);
        }

        debug!(task = %id, kind = task.kind(), invocation = %invocation.id(), time = invocation.current_time(), "start");
        with_context(task, invocation, world, assets, |ctx| task.on_start(ctx));
    }

    /// Silent no-op for a task that is not started.
    pub fn tick(
        &self,
        task: &dyn Task,
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
        delta: f32,
    ) {
        if expired(task, invocation, "tick") || !invocation.is_started(task.id()) {
            return;
        }
        with_context(task, invocation, world, assets, |ctx| task.on_tick(ctx, delta));
    }

    /// Ends a started task and releases its pad. Ending twice is a no-op.
    pub fn end(
        &self,
        task: &dyn Task,
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
        result: TaskResult,
    ) {
        if expired(task, invocation, "end") {
            return;
        }
        let id = task.id();
        if !invocation.is_started(id) {
            debug!(task = %id, "{}", TaskError::MissingScratchPad(id));
            return;
        }

        debug!(task = %id, kind = task.kind(), invocation = %invocation.id(), ?result, "end");
        with_context(task, invocation, world, assets, |ctx| task.on_end(ctx, result));
        if let Some(pad) = invocation.close_slot(id) {
            self.pool.release(pad);
        }
    }

    pub fn is_done(&self, task: &dyn Task, invocation: &Invocation) -> bool {
        task.is_done(invocation)
    }

    pub fn realm(&self, task: &dyn Task) -> TaskRealm {
        task.realm()
    }

    pub fn is_single_frame(&self, task: &dyn Task) -> bool {
        task.is_single_frame()
    }

    pub fn scratch_pad<'a>(&self, task: &dyn Task, invocation: &'a Invocation) -> Option<&'a dyn ScratchPad> {
        invocation.scratch_pad(task.id())
    }

    /// Change the ability-wide rate and notify every started task.
    pub fn set_play_rate(
        &self,
        tasks: &[Arc<dyn Task>],
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
        rate: f32,
    ) {
        if invocation.is_expired() {
            warn!(invocation = %invocation.id(), "{}", TaskError::InvalidInvocation(invocation.id()));
            return;
        }
        invocation.set_play_rate(rate);
        for task in tasks {
            if !invocation.is_started(task.id()) {
                continue;
            }
            with_context(task.as_ref(), invocation, world, assets, |ctx| {
                task.on_play_rate_changed(ctx, rate)
            });
        }
    }

    /// Reposition the clock and let started tasks follow.
    pub fn set_time(
        &self,
        tasks: &[Arc<dyn Task>],
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
        time: f32,
    ) {
        if invocation.is_expired() {
            warn!(invocation = %invocation.id(), "{}", TaskError::InvalidInvocation(invocation.id()));
            return;
        }
        invocation.set_current_time(time);
        for task in tasks {
            if !invocation.is_started(task.id()) {
                continue;
            }
            with_context(task.as_ref(), invocation, world, assets, |ctx| task.on_time_set(ctx));
        }
    }

    /// End every started task of `tasks`, in order.
    pub fn end_all(
        &self,
        tasks: &[Arc<dyn Task>],
        invocation: &mut Invocation,
        world: &mut dyn World,
        assets: &dyn AssetResolver,
        result: TaskResult,
    ) {
        for task in tasks {
            if invocation.is_started(task.id()) {
                self.end(task.as_ref(), invocation, world, assets, result);
            }
        }
    }
}

fn expired(task: &dyn Task, invocation: &Invocation, call: &str) -> bool {
    if invocation.is_expired() {
        warn!(task = %task.id(), call, "{}", TaskError::InvalidInvocation(invocation.id()));
        return true;
    }
    false
}

fn with_context<R>(
    task: &dyn Task,
    invocation: &mut Invocation,
    world: &mut dyn World,
    assets: &dyn AssetResolver,
    f: impl FnOnce(&mut TaskContext<'_>) -> R,
) -> R {
    let id = task.id();
    let mut pad = invocation.take_pad(id);
    let out = {
        let mut ctx = TaskContext {
            invocation: &mut *invocation,
            world,
            assets,
            pad: pad.as_deref_mut(),
        };
        f(&mut ctx)
    };
    invocation.put_pad(id, pad);
    out
}
