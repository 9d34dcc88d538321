//! Invocation (context): one timeline instance of a skill use.
//!
//! The host scheduler owns invocations; tasks only borrow them for the
//! duration of a lifecycle call. Besides the clock and the shared target
//! list, an invocation holds one scratch-pad slot per started task. A slot
//! exists exactly while its task is started.

use std::collections::HashMap;

use super::ids::{EntityId, InvocationId, TaskId};
use super::realm::NetworkRealm;
use super::target::TargetKind;
use crate::ports::World;
use crate::typed::scratch::ScratchPad;

pub struct Invocation {
    id: InvocationId,
    skill_name: String,

    self_entity: Option<EntityId>,
    owner: Option<EntityId>,
    instigator: Option<EntityId>,

    realm: NetworkRealm,

    /// false for preview / editor-like contexts.
    live: bool,

    current_time: f32,
    play_rate: f32,

    /// Ordered, mutable, shared across tasks. `None` entries are kept so that
    /// positional meaning survives.
    targets: Vec<Option<EntityId>>,

    task_start_times: HashMap<TaskId, f32>,

    /// task -> pad. Presence of the key means "started"; stateless tasks
    /// keep a `None` pad.
    pads: HashMap<TaskId, Option<Box<dyn ScratchPad>>>,

    expired: bool,
}

impl Invocation {
    pub fn new(id: InvocationId, skill_name: impl Into<String>) -> Self {
        Self {
            id,
            skill_name: skill_name.into(),
            self_entity: None,
            owner: None,
            instigator: None,
            realm: NetworkRealm::default(),
            live: true,
            current_time: 0.0,
            play_rate: 1.0,
            targets: Vec::new(),
            task_start_times: HashMap::new(),
            pads: HashMap::new(),
            expired: false,
        }
    }

    pub fn with_self_entity(mut self, entity: EntityId) -> Self {
        self.self_entity = Some(entity);
        self
    }

    pub fn with_owner(mut self, entity: EntityId) -> Self {
        self.owner = Some(entity);
        self
    }

    pub fn with_instigator(mut self, entity: EntityId) -> Self {
        self.instigator = Some(entity);
        self
    }

    pub fn with_realm(mut self, realm: NetworkRealm) -> Self {
        self.realm = realm;
        self
    }

    /// Mark the invocation as a preview (not live gameplay).
    pub fn preview(mut self) -> Self {
        self.live = false;
        self
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn skill_name(&self) -> &str {
        &self.skill_name
    }

    pub fn self_entity(&self) -> Option<EntityId> {
        self.self_entity
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn instigator(&self) -> Option<EntityId> {
        self.instigator
    }

    pub fn realm(&self) -> NetworkRealm {
        self.realm
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    // ---- clock ----

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn advance(&mut self, delta: f32) {
        self.current_time += delta;
    }

    /// Scrub the clock. Tasks are notified through `Runtime::set_time`.
    pub fn set_current_time(&mut self, time: f32) {
        self.current_time = time;
    }

    /// Ability-wide play rate.
    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    pub(crate) fn set_play_rate(&mut self, rate: f32) {
        self.play_rate = rate;
    }

    pub fn task_start_time(&self, task: TaskId) -> Option<f32> {
        self.task_start_times.get(&task).copied()
    }

    // ---- targets ----

    pub fn targets(&self) -> &[Option<EntityId>] {
        &self.targets
    }

    pub fn add_target(&mut self, entity: EntityId) {
        self.targets.push(Some(entity));
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    /// Replace the whole list, keeping empty slots.
    pub fn replace_targets(&mut self, targets: Vec<Option<EntityId>>) {
        self.targets = targets;
    }

    /// First slot of the target list, if it refers to a living entity.
    pub fn first_target(&self, world: &dyn World) -> Option<EntityId> {
        self.targets
            .first()
            .copied()
            .flatten()
            .filter(|e| world.is_alive(*e))
    }

    /// Entities a task acts on, in `kinds` order, skipping dead and duplicate ones.
    pub fn resolve_targets(&self, kinds: &[TargetKind], world: &dyn World) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = Vec::new();
        let mut push = |e: Option<EntityId>| {
            if let Some(e) = e
                && world.is_alive(e)
                && !out.contains(&e)
            {
                out.push(e);
            }
        };
        for kind in kinds {
            match kind {
                TargetKind::SelfEntity => push(self.self_entity),
                TargetKind::Owner => push(self.owner),
                TargetKind::Instigator => push(self.instigator),
                TargetKind::Targets => {
                    for t in &self.targets {
                        push(*t);
                    }
                }
            }
        }
        out
    }

    // ---- expiry ----

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// The skill is over; further lifecycle calls are ignored.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    // ---- scratch pad slots (driven by the runtime) ----

    pub fn is_started(&self, task: TaskId) -> bool {
        self.pads.contains_key(&task)
    }

    pub fn started_tasks(&self) -> Vec<TaskId> {
        self.pads.keys().copied().collect()
    }

    pub fn scratch_pad(&self, task: TaskId) -> Option<&dyn ScratchPad> {
        self.pads.get(&task).and_then(|p| p.as_deref())
    }

    pub(crate) fn open_slot(&mut self, task: TaskId, pad: Option<Box<dyn ScratchPad>>) {
        self.task_start_times.insert(task, self.current_time);
        self.pads.insert(task, pad);
    }

    /// Borrow the pad out of its slot for the duration of a call.
    pub(crate) fn take_pad(&mut self, task: TaskId) -> Option<Box<dyn ScratchPad>> {
        self.pads.get_mut(&task).and_then(Option::take)
    }

    pub(crate) fn put_pad(&mut self, task: TaskId, pad: Option<Box<dyn ScratchPad>>) {
        if let Some(slot) = self.pads.get_mut(&task) {
            *slot = pad;
        }
    }

    /// Close the slot. Returns the pad (if any) so it can go back to the pool.
    pub(crate) fn close_slot(&mut self, task: TaskId) -> Option<Box<dyn ScratchPad>> {
        self.task_start_times.remove(&task);
        self.pads.remove(&task).flatten()
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("skill_name", &self.skill_name)
            .field("current_time", &self.current_time)
            .field("targets", &self.targets)
            .field("started", &self.pads.len())
            .field("expired", &self.expired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryWorld;

    #[test]
    fn resolve_targets_skips_dead_and_duplicates() {
        let mut world = InMemoryWorld::new();
        let me = world.spawn("me");
        let foe = world.spawn("foe");
        let gone = world.spawn("gone");
        world.despawn(gone);

        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill").with_self_entity(me);
        inv.replace_targets(vec![Some(foe), None, Some(gone), Some(me)]);

        let resolved = inv.resolve_targets(&[TargetKind::SelfEntity, TargetKind::Targets], &world);
        assert_eq!(resolved, vec![me, foe]);
    }

    #[test]
    fn first_target_checks_validity() {
        let mut world = InMemoryWorld::new();
        let foe = world.spawn("foe");
        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill");
        inv.add_target(foe);
        assert_eq!(inv.first_target(&world), Some(foe));

        world.despawn(foe);
        assert_eq!(inv.first_target(&world), None);
    }

    #[test]
    fn slot_presence_tracks_start() {
        let mut inv = Invocation::new(InvocationId::from_u128(1), "skill");
        let task = TaskId::from_u128(9);
        assert!(!inv.is_started(task));

        inv.advance(0.5);
        inv.open_slot(task, None);
        assert!(inv.is_started(task));
        assert_eq!(inv.task_start_time(task), Some(0.5));

        assert!(inv.close_slot(task).is_none());
        assert!(!inv.is_started(task));
        assert_eq!(inv.task_start_time(task), None);
    }
}
