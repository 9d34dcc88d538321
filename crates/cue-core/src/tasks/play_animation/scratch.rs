//! Per-invocation working state of the animation task.

use std::any::Any;

use crate::domain::asset::{AssetHandle, SharedAsset};
use crate::domain::ids::{ComponentId, EntityId};
use crate::domain::params::VisibilityTick;
use crate::ports::NodeRef;
use crate::typed::{ScratchPad, TypedScratchPad};

/// A component the task started playback on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayedComponent {
    pub entity: EntityId,
    pub component: ComponentId,

    /// Graph node used in ability-node mode.
    pub node: Option<NodeRef>,

    /// Played through the direct player (single node, or preview fallback).
    pub direct: bool,
}

#[derive(Debug, Default)]
pub struct PlayAnimationScratchPad {
    /// Asset and section resolved for this invocation at start.
    pub asset: Option<SharedAsset>,
    pub section: Option<String>,

    pub played: Vec<PlayedComponent>,

    /// Components the end routine visits, each once.
    pub cleanup: Vec<ComponentId>,

    /// Ability-component registrations to release on end.
    pub ability_bindings: Vec<(EntityId, ComponentId, NodeRef)>,

    /// Composite instance currently playing (authored or synthesized).
    pub current_composite: Option<AssetHandle>,

    /// Off-screen tick settings to restore, in override order.
    pub cached_visibility: Vec<(ComponentId, VisibilityTick)>,
}

impl PlayAnimationScratchPad {
    pub(crate) fn remember_for_cleanup(&mut self, component: ComponentId) {
        if !self.cleanup.contains(&component) {
            self.cleanup.push(component);
        }
    }

    pub(crate) fn played(&self, component: ComponentId) -> Option<&PlayedComponent> {
        self.played.iter().find(|p| p.component == component)
    }

    pub(crate) fn has_cached_visibility(&self, component: ComponentId) -> bool {
        self.cached_visibility.iter().any(|(c, _)| *c == component)
    }
}

impl ScratchPad for PlayAnimationScratchPad {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn reset(&mut self) {
        self.asset = None;
        self.section = None;
        self.played.clear();
        self.cleanup.clear();
        self.ability_bindings.clear();
        self.current_composite = None;
        self.cached_visibility.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedScratchPad for PlayAnimationScratchPad {
    const KIND: &'static str = "play_animation";
}
