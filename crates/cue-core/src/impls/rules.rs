//! Targeting rules for development and tests.
//!
//! 本物のルール（範囲検索・フィルタ）はホスト側にあります。

use crate::domain::ids::EntityId;
use crate::domain::invocation::Invocation;
use crate::ports::{TargetingRule, World};

/// Appends a fixed list of entities (living ones only).
#[derive(Debug, Clone)]
pub struct FixedTargets {
    entities: Vec<EntityId>,
    clear: bool,
}

impl FixedTargets {
    pub fn new(entities: Vec<EntityId>) -> Self {
        Self {
            entities,
            clear: false,
        }
    }

    /// Clear the invocation's targets before finding.
    pub fn clearing(mut self) -> Self {
        self.clear = true;
        self
    }
}

impl TargetingRule for FixedTargets {
    fn should_clear_targets(&self) -> bool {
        self.clear
    }

    fn find_targets(&self, invocation: &mut Invocation, world: &dyn World) {
        for e in &self.entities {
            if world.is_alive(*e) {
                invocation.add_target(*e);
            }
        }
    }
}

/// Rule backed by a closure.
pub struct FnRule<F> {
    find: F,
    clear: bool,
}

impl<F> FnRule<F>
where
    F: Fn(&mut Invocation, &dyn World) + Send + Sync,
{
    pub fn new(clear: bool, find: F) -> Self {
        Self { find, clear }
    }
}

impl<F> TargetingRule for FnRule<F>
where
    F: Fn(&mut Invocation, &dyn World) + Send + Sync,
{
    fn should_clear_targets(&self) -> bool {
        self.clear
    }

    fn find_targets(&self, invocation: &mut Invocation, world: &dyn World) {
        (self.find)(invocation, world)
    }
}

/// Finds every living entity within `radius` of the invocation's self entity.
#[derive(Debug, Clone)]
pub struct NearbyTargets {
    candidates: Vec<EntityId>,
    radius: f32,
    clear: bool,
}

impl NearbyTargets {
    pub fn new(candidates: Vec<EntityId>, radius: f32, clear: bool) -> Self {
        Self {
            candidates,
            radius,
            clear,
        }
    }
}

impl TargetingRule for NearbyTargets {
    fn should_clear_targets(&self) -> bool {
        self.clear
    }

    fn find_targets(&self, invocation: &mut Invocation, world: &dyn World) {
        let Some(origin) = invocation.self_entity().and_then(|e| world.location(e)) else {
            return;
        };
        let radius_sq = self.radius * self.radius;
        for e in &self.candidates {
            if let Some(loc) = world.location(*e)
                && loc.sub(origin).length_squared() <= radius_sq
            {
                invocation.add_target(*e);
            }
        }
    }
}
