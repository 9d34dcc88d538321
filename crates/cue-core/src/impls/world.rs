//! InMemoryWorld - 開発用のホストワールド
//!
//! エンティティ・再生コンポーネント・回転・その場旋回フラグを
//! メモリ上に持ちます。デモとテスト用。
//!
//! # 実装詳細
//! - ID は `IdGenerator` から払い出す（デフォルトは UlidGenerator + SystemClock）
//! - エンティティを despawn するとコンポーネントも消える（弱参照が無効になる）

use std::collections::HashMap;

use super::playback::InMemoryPlayback;
use crate::domain::ids::{ComponentId, EntityId};
use crate::domain::math::{Rotator, Vec3};
use crate::ports::{
    IdGenerator, NodeRef, PlaybackComponent, RotationDriver, SystemClock, TurnInPlace,
    UlidGenerator, World,
};

/// Turn-in-place flags as the entity's animation graph would read them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurnState {
    pub can_turn: bool,
    pub rotate_on_spot: bool,
    pub direction: f32,
}

impl TurnInPlace for TurnState {
    fn set_can_turn(&mut self, can_turn: bool) {
        self.can_turn = can_turn;
    }

    fn can_turn(&self) -> bool {
        self.can_turn
    }

    fn set_rotate_on_spot(&mut self, enabled: bool) {
        self.rotate_on_spot = enabled;
    }

    fn set_rotate_on_spot_direction(&mut self, delta_yaw: f32) {
        self.direction = delta_yaw;
    }
}

/// Rotation driver that records how it was used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecordingDriver {
    pub rotation: Option<Rotator>,
    pub calls: u32,
    pub last_sweep: Option<bool>,
}

impl RotationDriver for RecordingDriver {
    fn set_rotation(&mut self, rotation: Rotator, sweep: bool) {
        self.rotation = Some(rotation);
        self.calls += 1;
        self.last_sweep = Some(sweep);
    }
}

struct EntityRecord {
    name: String,
    location: Vec3,
    rotation: Rotator,
    body_rotation: Option<Rotator>,
    master: Option<EntityId>,
    components: Vec<ComponentId>,
    preferred: HashMap<Option<String>, ComponentId>,
    ability_nodes: Option<Vec<(ComponentId, NodeRef)>>,
    driver: Option<RecordingDriver>,
    turn: Option<TurnState>,
    base_rotation_calls: u32,
}

impl EntityRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            body_rotation: None,
            master: None,
            components: Vec::new(),
            preferred: HashMap::new(),
            ability_nodes: None,
            driver: None,
            turn: None,
            base_rotation_calls: 0,
        }
    }

    /// What the entity's driver last set wins over the root rotation.
    fn effective_rotation(&self) -> Rotator {
        self.driver
            .and_then(|d| d.rotation)
            .unwrap_or(self.rotation)
    }
}

pub struct InMemoryWorld {
    ids: Box<dyn IdGenerator>,
    entities: HashMap<EntityId, EntityRecord>,
    components: HashMap<ComponentId, InMemoryPlayback>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            ids,
            entities: HashMap::new(),
            components: HashMap::new(),
        }
    }

    // ---- entities ----

    pub fn spawn(&mut self, name: &str) -> EntityId {
        let id = self.ids.generate_entity_id();
        self.entities.insert(id, EntityRecord::new(name));
        id
    }

    pub fn despawn(&mut self, entity: EntityId) {
        if let Some(record) = self.entities.remove(&entity) {
            for c in record.components {
                self.components.remove(&c);
            }
        }
    }

    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.entities.get(&entity).map(|r| r.name.as_str())
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn place(&mut self, entity: EntityId, location: Vec3) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.location = location;
        }
    }

    pub fn set_root_rotation(&mut self, entity: EntityId, rotation: Rotator) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.rotation = rotation;
            if let Some(d) = &mut r.driver {
                d.rotation = None;
            }
        }
    }

    pub fn set_body_rotation(&mut self, entity: EntityId, rotation: Rotator) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.body_rotation = Some(rotation);
        }
    }

    pub fn set_master(&mut self, entity: EntityId, master: EntityId) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.master = Some(master);
        }
    }

    pub fn base_rotation_calls(&self, entity: EntityId) -> u32 {
        self.entities
            .get(&entity)
            .map(|r| r.base_rotation_calls)
            .unwrap_or(0)
    }

    // ---- optional capabilities ----

    pub fn add_rotation_driver(&mut self, entity: EntityId) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.driver = Some(RecordingDriver::default());
        }
    }

    pub fn driver(&self, entity: EntityId) -> Option<RecordingDriver> {
        self.entities.get(&entity).and_then(|r| r.driver)
    }

    pub fn add_turn_in_place(&mut self, entity: EntityId) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.turn = Some(TurnState::default());
        }
    }

    pub fn turn_state(&self, entity: EntityId) -> Option<TurnState> {
        self.entities.get(&entity).and_then(|r| r.turn)
    }

    pub fn add_ability_component(&mut self, entity: EntityId) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.ability_nodes = Some(Vec::new());
        }
    }

    /// Nodes registered on the entity's ability component.
    pub fn ability_nodes(&self, entity: EntityId) -> Vec<(ComponentId, NodeRef)> {
        self.entities
            .get(&entity)
            .and_then(|r| r.ability_nodes.clone())
            .unwrap_or_default()
    }

    // ---- playback components ----

    pub fn add_playback_component(&mut self, entity: EntityId) -> Option<ComponentId> {
        let record = self.entities.get_mut(&entity)?;
        let id = self.ids.generate_component_id();
        record.components.push(id);
        self.components.insert(id, InMemoryPlayback::new(entity));
        Some(id)
    }

    pub fn remove_playback_component(&mut self, component: ComponentId) {
        if let Some(p) = self.components.remove(&component)
            && let Some(r) = self.entities.get_mut(&p.owner())
        {
            r.components.retain(|c| *c != component);
        }
    }

    /// Make `component` the answer to `preferred_playback_component(entity, event)`.
    pub fn prefer_component(&mut self, entity: EntityId, event: Option<&str>, component: ComponentId) {
        if let Some(r) = self.entities.get_mut(&entity) {
            r.preferred.insert(event.map(str::to_string), component);
        }
    }

    pub fn add_ability_node(&mut self, component: ComponentId, state_machine: &str, state: &str) -> Option<NodeRef> {
        self.components
            .get_mut(&component)
            .map(|p| p.add_ability_node(state_machine, state))
    }

    pub fn playback_state(&self, component: ComponentId) -> Option<&InMemoryPlayback> {
        self.components.get(&component)
    }

    pub fn playback_state_mut(&mut self, component: ComponentId) -> Option<&mut InMemoryPlayback> {
        self.components.get_mut(&component)
    }

    /// Advance every player by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        for p in self.components.values_mut() {
            p.advance(delta);
        }
    }
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for InMemoryWorld {
    fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn playback_components(&self, entity: EntityId) -> Vec<ComponentId> {
        self.entities
            .get(&entity)
            .map(|r| r.components.clone())
            .unwrap_or_default()
    }

    fn preferred_playback_component(&self, entity: EntityId, event_name: Option<&str>) -> Option<ComponentId> {
        let record = self.entities.get(&entity)?;
        record
            .preferred
            .get(&event_name.map(str::to_string))
            .copied()
            .filter(|c| self.components.contains_key(c))
    }

    fn playback(&mut self, component: ComponentId) -> Option<&mut dyn PlaybackComponent> {
        self.components
            .get_mut(&component)
            .map(|p| p as &mut dyn PlaybackComponent)
    }

    fn bind_ability_node(&mut self, entity: EntityId, component: ComponentId, node: NodeRef) -> bool {
        match self.entities.get_mut(&entity).and_then(|r| r.ability_nodes.as_mut()) {
            Some(nodes) => {
                nodes.retain(|(c, _)| *c != component);
                nodes.push((component, node));
                true
            }
            None => false,
        }
    }

    fn unbind_ability_node(&mut self, entity: EntityId, component: ComponentId, node: NodeRef) {
        if let Some(nodes) = self.entities.get_mut(&entity).and_then(|r| r.ability_nodes.as_mut()) {
            nodes.retain(|&binding| binding != (component, node));
        }
    }

    fn location(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|r| r.location)
    }

    fn rotation(&self, entity: EntityId) -> Option<Rotator> {
        self.entities.get(&entity).map(EntityRecord::effective_rotation)
    }

    fn body_rotation(&self, entity: EntityId) -> Option<Rotator> {
        self.entities.get(&entity).and_then(|r| r.body_rotation)
    }

    fn master(&self, entity: EntityId) -> Option<EntityId> {
        self.entities
            .get(&entity)
            .and_then(|r| r.master)
            .filter(|m| self.entities.contains_key(m))
    }

    fn set_rotation(&mut self, entity: EntityId, rotation: Rotator) -> bool {
        match self.entities.get_mut(&entity) {
            Some(r) => {
                r.rotation = rotation;
                r.base_rotation_calls += 1;
                if let Some(d) = &mut r.driver {
                    d.rotation = None;
                }
                true
            }
            None => false,
        }
    }

    fn rotation_driver(&mut self, entity: EntityId) -> Option<&mut dyn RotationDriver> {
        self.entities
            .get_mut(&entity)
            .and_then(|r| r.driver.as_mut())
            .map(|d| d as &mut dyn RotationDriver)
    }

    fn turn_in_place(&mut self, entity: EntityId) -> Option<&mut dyn TurnInPlace> {
        self.entities
            .get_mut(&entity)
            .and_then(|r| r.turn.as_mut())
            .map(|t| t as &mut dyn TurnInPlace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn despawn_invalidates_components() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn("hero");
        let c = world.add_playback_component(e).unwrap();
        assert!(world.playback(c).is_some());

        world.despawn(e);
        assert!(!world.is_alive(e));
        assert!(world.playback(c).is_none());
    }

    #[test]
    fn preferred_component_is_per_event() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn("hero");
        let first = world.add_playback_component(e).unwrap();
        let second = world.add_playback_component(e).unwrap();
        world.prefer_component(e, Some("Weapon"), second);

        assert_eq!(world.playback_components(e), vec![first, second]);
        assert_eq!(world.preferred_playback_component(e, Some("Weapon")), Some(second));
        assert_eq!(world.preferred_playback_component(e, None), None);
    }

    #[test]
    fn driver_rotation_is_visible_through_rotation() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn("hero");
        world.add_rotation_driver(e);
        world
            .rotation_driver(e)
            .unwrap()
            .set_rotation(Rotator::from_yaw(45.0), false);

        assert_eq!(world.rotation(e), Some(Rotator::from_yaw(45.0)));
        assert_eq!(world.base_rotation_calls(e), 0);
        assert_eq!(world.driver(e).unwrap().last_sweep, Some(false));
    }

    #[test]
    fn ability_node_binding_requires_ability_component() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn("hero");
        let c = world.add_playback_component(e).unwrap();
        let node = world.add_ability_node(c, "Locomotion", "Ability").unwrap();

        assert!(!world.bind_ability_node(e, c, node));
        world.add_ability_component(e);
        assert!(world.bind_ability_node(e, c, node));
        assert_eq!(world.ability_nodes(e), vec![(c, node)]);
    }

    #[test]
    fn unbind_removes_only_the_matching_node() {
        let mut world = InMemoryWorld::new();
        let e = world.spawn("hero");
        world.add_ability_component(e);
        let c = world.add_playback_component(e).unwrap();
        let other = world.add_playback_component(e).unwrap();
        let node = world.add_ability_node(c, "Locomotion", "Ability").unwrap();
        let kept = world.add_ability_node(other, "Locomotion", "Ability").unwrap();
        world.bind_ability_node(e, c, node);
        world.bind_ability_node(e, other, kept);

        world.unbind_ability_node(e, c, node);
        assert_eq!(world.ability_nodes(e), vec![(other, kept)]);
    }
}
