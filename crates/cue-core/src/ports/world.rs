//! World port - エンティティと再生コンポーネントへのアクセス
//!
//! エンジン側の Entity / Component はすべて弱参照（ID）で扱います。
//! フレームをまたいで破棄されることがあるので、使うたびに
//! `is_alive` / `playback` の結果を確認してください。

use crate::domain::asset::{AnimationAsset, AssetHandle, ClipAsset, CompositeAsset};
use crate::domain::ids::{ComponentId, EntityId};
use crate::domain::math::{Rotator, Vec3};
use crate::domain::params::{AlphaBlend, BlendTimes, PlaybackMode, VisibilityTick};

/// Opaque handle to an ability animation node inside a component's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u32);

/// Request to play a composite clip directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositePlay {
    pub rate: f32,
    pub start_at: f32,
    pub stop_others: bool,
}

/// Request to play a plain clip as a temporary composite on a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlay {
    pub slot: String,
    pub blend: BlendTimes,
    pub rate: f32,
    pub loop_count: i32,
    pub blend_out_trigger: f32,
    pub start_at: f32,
    pub stop_others: bool,
}

/// One playback component (e.g. a skeletal mesh with an animation graph).
pub trait PlaybackComponent {
    fn owner(&self) -> EntityId;

    fn mode(&self) -> PlaybackMode;
    fn set_mode(&mut self, mode: PlaybackMode);

    // ---- composites (graph-driven instance) ----

    fn play_composite(&mut self, composite: &CompositeAsset, request: &CompositePlay) -> bool;

    /// Synthesizes a composite around `clip` and returns its handle.
    fn play_clip_as_composite(&mut self, clip: &ClipAsset, request: &SlotPlay) -> Option<AssetHandle>;

    fn active_composite(&self) -> Option<AssetHandle>;
    fn jump_to_section(&mut self, section: &str) -> bool;
    fn set_composite_play_rate(&mut self, composite: &AssetHandle, rate: f32);
    fn composite_position(&self) -> Option<f32>;
    fn set_composite_position(&mut self, composite: &AssetHandle, position: f32);
    fn blend_out_composite(&mut self, blend_out: f32);

    // ---- ad-hoc direct player ----

    fn has_direct_player(&self) -> bool;

    /// Swap the asset of the existing direct player without a mode change.
    fn retarget_direct(&mut self, asset: &AnimationAsset, looping: bool, rate: f32);

    /// Start a fresh direct player. Callers switch the mode first.
    fn play_direct(&mut self, asset: &AnimationAsset, looping: bool, rate: f32);
    fn stop_direct(&mut self);
    fn set_direct_play_rate(&mut self, rate: f32);
    fn direct_position(&self) -> Option<f32>;
    fn set_direct_position(&mut self, position: f32);

    // ---- ability graph node ----

    fn find_ability_node(&self, state_machine: &str, state: &str) -> Option<NodeRef>;
    fn node_play(&mut self, node: NodeRef, clip: &ClipAsset, rate: f32, blend_in: AlphaBlend, blend_out: AlphaBlend);
    fn node_abort(&mut self, node: NodeRef, clear_queue: bool);
    fn node_set_time(&mut self, node: NodeRef, time: f32);
    fn node_set_play_rate(&mut self, node: NodeRef, rate: f32);

    // ---- off-screen ticking ----

    fn visibility_tick(&self) -> VisibilityTick;
    fn set_visibility_tick(&mut self, tick: VisibilityTick);

    /// Dedicated servers do not tick animation unless asked to.
    fn request_tick(&mut self, _reason: &str, _enabled: bool) {}
}

/// Specialized rotation setter some entities expose.
pub trait RotationDriver {
    fn set_rotation(&mut self, rotation: Rotator, sweep: bool);
}

/// Animation-side turning flags of an entity.
pub trait TurnInPlace {
    /// "May turn" flag read by the entity's animation graph.
    fn set_can_turn(&mut self, can_turn: bool);
    fn can_turn(&self) -> bool;

    fn set_rotate_on_spot(&mut self, enabled: bool);
    fn set_rotate_on_spot_direction(&mut self, delta_yaw: f32);
}

/// World はホスト側のエンティティ集合
///
/// # Validity
/// - `is_alive` が false のエンティティは黙ってスキップする
/// - `playback` が None のコンポーネントも同様
pub trait World {
    fn is_alive(&self, entity: EntityId) -> bool;

    /// All playback components of `entity`, in a stable order.
    fn playback_components(&self, entity: EntityId) -> Vec<ComponentId>;

    /// Host hook choosing a component for a given event name.
    fn preferred_playback_component(
        &self,
        _entity: EntityId,
        _event_name: Option<&str>,
    ) -> Option<ComponentId> {
        None
    }

    fn playback(&mut self, component: ComponentId) -> Option<&mut dyn PlaybackComponent>;

    /// Register `node` on the entity's ability component. false if the
    /// entity has none.
    fn bind_ability_node(&mut self, entity: EntityId, component: ComponentId, node: NodeRef) -> bool;

    /// Drop a registration made by `bind_ability_node`. Other bindings on
    /// the same component are left alone.
    fn unbind_ability_node(&mut self, entity: EntityId, component: ComponentId, node: NodeRef);

    fn location(&self, entity: EntityId) -> Option<Vec3>;

    /// Root rotation.
    fn rotation(&self, entity: EntityId) -> Option<Rotator>;

    /// World rotation of the animated body, if the entity has one.
    fn body_rotation(&self, _entity: EntityId) -> Option<Rotator> {
        None
    }

    /// Controlling entity, if any.
    fn master(&self, _entity: EntityId) -> Option<EntityId> {
        None
    }

    /// Base rotation setter (sweeps for collision).
    fn set_rotation(&mut self, entity: EntityId, rotation: Rotator) -> bool;

    fn rotation_driver(&mut self, _entity: EntityId) -> Option<&mut dyn RotationDriver> {
        None
    }

    fn turn_in_place(&mut self, _entity: EntityId) -> Option<&mut dyn TurnInPlace> {
        None
    }
}
