//! Task trait - すべてのタスクが従う lifecycle 契約
//!
//! # Lifecycle
//! ```text
//! start → tick* → end(result)
//! ```
//! - `on_end` は start 1 回につき必ず 1 回（Runtime が保証する）
//! - scratch pad は start 中だけ存在し、呼び出しの間だけ `TaskContext` に貸し出される
//! - lifecycle メソッドはエラーを返さない。失敗はログに出して縮退する

use serde::{Deserialize, Serialize};

use super::bindable::SkillBindings;
use super::registry::RegistryError;
use super::scratch::{ScratchPad, ScratchPadPool, TypedScratchPad};
use crate::domain::ids::TaskId;
use crate::domain::invocation::Invocation;
use crate::domain::outcome::TaskResult;
use crate::domain::realm::TaskRealm;
use crate::ports::{AssetResolver, World};

/// Configured timing window of a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTiming {
    pub start_time: f32,
    pub end_time: f32,
}

impl TaskTiming {
    pub fn new(start_time: f32, end_time: f32) -> Self {
        Self {
            start_time,
            end_time,
        }
    }
}

impl Default for TaskTiming {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 1.0,
        }
    }
}

/// Everything a lifecycle call may touch.
///
/// Fields are public so a task can borrow them independently
/// (e.g. its pad and the world at the same time).
pub struct TaskContext<'a> {
    pub invocation: &'a mut Invocation,
    pub world: &'a mut dyn World,
    pub assets: &'a dyn AssetResolver,
    pub pad: Option<&'a mut (dyn ScratchPad + 'static)>,
}

impl<'a> TaskContext<'a> {
    /// The borrowed pad as `P`, if present and of that type.
    pub fn pad_mut<P: TypedScratchPad>(&mut self) -> Option<&mut P> {
        self.pad.as_deref_mut().and_then(|p| p.downcast_mut::<P>())
    }
}

/// A configured, reusable unit of time-scoped behaviour.
///
/// Implementations are immutable once the skill is built and are shared
/// by every invocation of that skill.
pub trait Task: Send + Sync {
    fn id(&self) -> TaskId;

    /// Short type name used in logs ("play_animation", ...).
    fn kind(&self) -> &'static str;

    fn timing(&self) -> TaskTiming;

    fn start_time(&self) -> f32 {
        self.timing().start_time
    }

    fn end_time(&self) -> f32 {
        self.timing().end_time
    }

    /// Advisory; the scheduler decides where the task actually runs.
    fn realm(&self) -> TaskRealm {
        TaskRealm::ClientAndServer
    }

    fn is_single_frame(&self) -> bool {
        false
    }

    /// Kind of pad this task needs, checked by the builder.
    fn scratch_pad_kind(&self) -> Option<&'static str> {
        None
    }

    fn create_scratch_pad(
        &self,
        _pool: &ScratchPadPool,
    ) -> Result<Option<Box<dyn ScratchPad>>, RegistryError> {
        Ok(None)
    }

    fn on_start(&self, ctx: &mut TaskContext<'_>);

    fn on_tick(&self, _ctx: &mut TaskContext<'_>, _delta: f32) {}

    /// The only deterministic cleanup point.
    fn on_end(&self, _ctx: &mut TaskContext<'_>, _result: TaskResult) {}

    fn is_done(&self, invocation: &Invocation) -> bool {
        invocation.current_time() >= self.end_time()
    }

    /// The owning skill's play rate changed mid-flight.
    fn on_play_rate_changed(&self, _ctx: &mut TaskContext<'_>, _new_rate: f32) {}

    /// The invocation's clock was repositioned.
    fn on_time_set(&self, _ctx: &mut TaskContext<'_>) {}

    /// Attach per-skill resolvers to bindable parameters.
    fn bind_dynamic(&mut self, _bindings: &SkillBindings) {}

    /// Pre-resolve statically configured assets.
    fn resolve_assets(&mut self, _assets: &dyn AssetResolver) {}

    fn describe(&self) -> String {
        self.kind().to_string()
    }
}
