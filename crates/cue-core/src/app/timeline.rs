//! TimelineDriver - 最小のスケジューラ（参照実装）
//!
//! 本来「いつ呼ぶか」はホストの責務です。CLI と結合テストのために、
//! 1 つの invocation を時間軸に沿って進める最小限のドライバを用意しています。
//!
//! # 1 フレームの流れ（`advance`）
//! ```text
//! clock += delta → 実行中タスクを tick → 終わったタスクを end(Successful)
//!                → 開始時刻に達したタスクを start
//! ```
//! - realm が合わないタスクは開始せずに捨てる
//! - single-frame タスクは start 直後に end(Successful)
//! - `interrupt` / `stop` は実行中タスクを指定の結果で 1 回だけ end する

use std::sync::Arc;

use tracing::{debug, info};

use super::builder::Skill;
use super::runtime::Runtime;
use super::status::{EndedTask, Status, TaskCounts};
use crate::domain::ids::TaskId;
use crate::domain::invocation::Invocation;
use crate::domain::outcome::TaskResult;
use crate::ports::{AssetResolver, World};

pub struct TimelineDriver {
    runtime: Arc<Runtime>,
    skill: Arc<Skill>,
    invocation: Invocation,

    /// Indices into `skill.tasks()`.
    pending: Vec<usize>,
    active: Vec<usize>,

    results: Vec<(TaskId, TaskResult)>,
}

impl TimelineDriver {
    pub fn new(runtime: Arc<Runtime>, skill: Arc<Skill>, invocation: Invocation) -> Self {
        let pending = (0..skill.len()).collect();
        Self {
            runtime,
            skill,
            invocation,
            pending,
            active: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn skill(&self) -> &Skill {
        &self.skill
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn invocation_mut(&mut self) -> &mut Invocation {
        &mut self.invocation
    }

    /// Tasks ended so far, in end order.
    pub fn results(&self) -> &[(TaskId, TaskResult)] {
        &self.results
    }

    pub fn active_tasks(&self) -> Vec<TaskId> {
        self.active.iter().map(|&i| self.skill.tasks()[i].id()).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    pub fn status(&self) -> Status {
        let ended: Vec<EndedTask> = self
            .results
            .iter()
            .map(|&(task, result)| EndedTask { task, result })
            .collect();
        Status {
            skill: self.skill.name().to_string(),
            invocation: self.invocation.id(),
            time: self.invocation.current_time(),
            finished: self.is_finished(),
            counts: TaskCounts::tally(self.pending.len(), self.active.len(), &ended),
            ended,
            targets: self.invocation.targets().to_vec(),
        }
    }

    /// Start every task due at the current time.
    pub fn begin(&mut self, world: &mut dyn World, assets: &dyn AssetResolver) {
        info!(skill = self.skill.name(), invocation = %self.invocation.id(), tasks = self.skill.len(), "skill begins");
        self.start_due(world, assets);
        self.finish_if_done();
    }

    /// Advance one frame.
    pub fn advance(&mut self, delta: f32, world: &mut dyn World, assets: &dyn AssetResolver) {
        if self.is_finished() || self.invocation.is_expired() {
            return;
        }
        self.invocation.advance(delta);

        let skill = Arc::clone(&self.skill);
        for &i in &self.active {
            self.runtime.tick(skill.tasks()[i].as_ref(), &mut self.invocation, world, assets, delta);
        }

        let (done, running): (Vec<usize>, Vec<usize>) = self
            .active
            .iter()
            .partition(|&&i| self.runtime.is_done(skill.tasks()[i].as_ref(), &self.invocation));
        self.active = running;
        for i in done {
            self.end_task(i, TaskResult::Successful, world, assets);
        }

        self.start_due(world, assets);
        self.finish_if_done();
    }

    pub fn interrupt(&mut self, world: &mut dyn World, assets: &dyn AssetResolver) {
        self.stop(TaskResult::Interrupted, world, assets);
    }

    /// End every running task with `result` and drop the ones not started yet.
    pub fn stop(&mut self, result: TaskResult, world: &mut dyn World, assets: &dyn AssetResolver) {
        if self.is_finished() {
            return;
        }
        info!(skill = self.skill.name(), invocation = %self.invocation.id(), ?result, "skill stopped");
        self.pending.clear();
        for i in std::mem::take(&mut self.active) {
            self.end_task(i, result, world, assets);
        }
        self.finish_if_done();
    }

    pub fn set_play_rate(&mut self, rate: f32, world: &mut dyn World, assets: &dyn AssetResolver) {
        self.runtime
            .set_play_rate(self.skill.tasks(), &mut self.invocation, world, assets, rate);
    }

    pub fn set_time(&mut self, time: f32, world: &mut dyn World, assets: &dyn AssetResolver) {
        self.runtime
            .set_time(self.skill.tasks(), &mut self.invocation, world, assets, time);
    }

    fn start_due(&mut self, world: &mut dyn World, assets: &dyn AssetResolver) {
        let skill = Arc::clone(&self.skill);
        let now = self.invocation.current_time();
        let realm = self.invocation.realm();

        let (due, later): (Vec<usize>, Vec<usize>) = self
            .pending
            .iter()
            .partition(|&&i| skill.tasks()[i].start_time() <= now);
        self.pending = later;

        for i in due {
            let task = skill.tasks()[i].as_ref();
            if !self.runtime.realm(task).runs_in(realm) {
                debug!(task = %task.id(), kind = task.kind(), ?realm, "skipped for realm");
                continue;
            }
            self.runtime.start(task, &mut self.invocation, world, assets);
            if !self.invocation.is_started(task.id()) {
                continue;
            }
            info!(task = %task.id(), kind = task.kind(), time = now, "task started");
            if self.runtime.is_single_frame(task) {
                self.end_task(i, TaskResult::Successful, world, assets);
            } else {
                self.active.push(i);
            }
        }
    }

    fn end_task(&mut self, index: usize, result: TaskResult, world: &mut dyn World, assets: &dyn AssetResolver) {
        let task = Arc::clone(&self.skill.tasks()[index]);
        self.runtime
            .end(task.as_ref(), &mut self.invocation, world, assets, result);
        info!(task = %task.id(), kind = task.kind(), ?result, time = self.invocation.current_time(), "task ended");
        self.results.push((task.id(), result));
    }

    fn finish_if_done(&mut self) {
        if self.is_finished() && !self.invocation.is_expired() {
            info!(skill = self.skill.name(), invocation = %self.invocation.id(), "skill finished");
            self.invocation.expire();
        }
    }
}
