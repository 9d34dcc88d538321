//! InMemoryPlayback - 開発用の再生コンポーネント
//!
//! 実際のポーズ計算はしません。再生状態（composite / direct / graph node）
//! を保持し、すべての呼び出しを `PlaybackCall` として記録します。
//! テストは記録を見て「abort がちょうど 1 回」などを検証します。

use std::collections::HashMap;

use crate::domain::asset::{AnimationAsset, AssetHandle, ClipAsset, CompositeAsset, CompositeSection};
use crate::domain::ids::EntityId;
use crate::domain::params::{AlphaBlend, PlaybackMode, VisibilityTick};
use crate::ports::{CompositePlay, NodeRef, PlaybackComponent, SlotPlay};

/// One recorded call on a playback component.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCall {
    SetMode(PlaybackMode),
    PlayComposite {
        composite: AssetHandle,
        rate: f32,
        start_at: f32,
        stop_others: bool,
    },
    PlayClipAsComposite {
        clip: AssetHandle,
        slot: String,
        rate: f32,
        loop_count: i32,
        blend_out_trigger: f32,
        start_at: f32,
    },
    JumpToSection(String),
    SetCompositePlayRate(f32),
    SetCompositePosition(f32),
    BlendOutComposite(f32),
    RetargetDirect {
        asset: AssetHandle,
        looping: bool,
        rate: f32,
    },
    PlayDirect {
        asset: AssetHandle,
        looping: bool,
        rate: f32,
    },
    StopDirect,
    SetDirectPlayRate(f32),
    SetDirectPosition(f32),
    NodePlay {
        node: NodeRef,
        clip: AssetHandle,
        rate: f32,
    },
    NodeAbort {
        node: NodeRef,
        clear_queue: bool,
    },
    NodeSetTime {
        node: NodeRef,
        time: f32,
    },
    NodeSetPlayRate {
        node: NodeRef,
        rate: f32,
    },
    SetVisibilityTick(VisibilityTick),
    RequestTick {
        reason: String,
        enabled: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeState {
    pub handle: AssetHandle,
    pub sections: Vec<CompositeSection>,
    pub rate: f32,
    pub position: f32,
    pub loop_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectState {
    pub asset: AssetHandle,
    pub looping: bool,
    pub rate: f32,
    pub position: f32,
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub clip: Option<AssetHandle>,
    pub rate: f32,
    pub time: f32,
}

pub struct InMemoryPlayback {
    owner: EntityId,
    mode: PlaybackMode,
    composite: Option<CompositeState>,
    direct: Option<DirectState>,
    nodes: HashMap<(String, String), NodeRef>,
    node_states: HashMap<NodeRef, NodeState>,
    visibility_tick: VisibilityTick,
    tick_requested: bool,
    calls: Vec<PlaybackCall>,
}

impl InMemoryPlayback {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            mode: PlaybackMode::GraphDriven,
            composite: None,
            direct: None,
            nodes: HashMap::new(),
            node_states: HashMap::new(),
            visibility_tick: VisibilityTick::default(),
            tick_requested: false,
            calls: Vec::new(),
        }
    }

    /// Add an ability node to the graph under (state machine, state).
    pub fn add_ability_node(&mut self, state_machine: &str, state: &str) -> NodeRef {
        let node = NodeRef(self.nodes.len() as u32);
        self.nodes
            .insert((state_machine.to_string(), state.to_string()), node);
        self.node_states.insert(
            node,
            NodeState {
                clip: None,
                rate: 1.0,
                time: 0.0,
            },
        );
        node
    }

    pub fn calls(&self) -> &[PlaybackCall] {
        &self.calls
    }

    pub fn count_calls(&self, predicate: impl Fn(&PlaybackCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn composite(&self) -> Option<&CompositeState> {
        self.composite.as_ref()
    }

    pub fn direct(&self) -> Option<&DirectState> {
        self.direct.as_ref()
    }

    pub fn node_state(&self, node: NodeRef) -> Option<&NodeState> {
        self.node_states.get(&node)
    }

    pub fn is_tick_requested(&self) -> bool {
        self.tick_requested
    }

    /// Move every active player forward by `delta` seconds of wall time.
    pub fn advance(&mut self, delta: f32) {
        if let Some(c) = &mut self.composite {
            c.position += delta * c.rate;
        }
        if let Some(d) = &mut self.direct
            && d.playing
        {
            d.position += delta * d.rate;
        }
        for state in self.node_states.values_mut() {
            if state.clip.is_some() {
                state.time += delta * state.rate;
            }
        }
    }

    fn start_direct(&mut self, asset: &AnimationAsset, looping: bool, rate: f32) {
        self.direct = Some(DirectState {
            asset: asset.handle().clone(),
            looping,
            rate,
            position: 0.0,
            playing: true,
        });
    }
}

impl PlaybackComponent for InMemoryPlayback {
    fn owner(&self) -> EntityId {
        self.owner
    }

    fn mode(&self) -> PlaybackMode {
        self.mode
    }

    fn set_mode(&mut self, mode: PlaybackMode) {
        self.calls.push(PlaybackCall::SetMode(mode));
        self.mode = mode;
    }

    fn play_composite(&mut self, composite: &CompositeAsset, request: &CompositePlay) -> bool {
        self.calls.push(PlaybackCall::PlayComposite {
            composite: composite.handle.clone(),
            rate: request.rate,
            start_at: request.start_at,
            stop_others: request.stop_others,
        });
        self.composite = Some(CompositeState {
            handle: composite.handle.clone(),
            sections: composite.sections.clone(),
            rate: request.rate,
            position: request.start_at,
            loop_count: 1,
        });
        true
    }

    fn play_clip_as_composite(&mut self, clip: &ClipAsset, request: &SlotPlay) -> Option<AssetHandle> {
        self.calls.push(PlaybackCall::PlayClipAsComposite {
            clip: clip.handle.clone(),
            slot: request.slot.clone(),
            rate: request.rate,
            loop_count: request.loop_count,
            blend_out_trigger: request.blend_out_trigger,
            start_at: request.start_at,
        });
        let handle = AssetHandle::new(format!("{}@{}", clip.handle, request.slot));
        self.composite = Some(CompositeState {
            handle: handle.clone(),
            sections: vec![CompositeSection {
                name: "Default".to_string(),
                start_time: 0.0,
                length: clip.length,
            }],
            rate: request.rate,
            position: request.start_at,
            loop_count: request.loop_count,
        });
        Some(handle)
    }

    fn active_composite(&self) -> Option<AssetHandle> {
        self.composite.as_ref().map(|c| c.handle.clone())
    }

    fn jump_to_section(&mut self, section: &str) -> bool {
        self.calls.push(PlaybackCall::JumpToSection(section.to_string()));
        let Some(c) = &mut self.composite else {
            return false;
        };
        match c.sections.iter().find(|s| s.name == section) {
            Some(s) => {
                c.position = s.start_time;
                true
            }
            None => false,
        }
    }

    fn set_composite_play_rate(&mut self, composite: &AssetHandle, rate: f32) {
        if let Some(c) = &mut self.composite
            && &c.handle == composite
        {
            self.calls.push(PlaybackCall::SetCompositePlayRate(rate));
            c.rate = rate;
        }
    }

    fn composite_position(&self) -> Option<f32> {
        self.composite.as_ref().map(|c| c.position)
    }

    fn set_composite_position(&mut self, composite: &AssetHandle, position: f32) {
        if let Some(c) = &mut self.composite
            && &c.handle == composite
        {
            self.calls.push(PlaybackCall::SetCompositePosition(position));
            c.position = position;
        }
    }

    fn blend_out_composite(&mut self, blend_out: f32) {
        self.calls.push(PlaybackCall::BlendOutComposite(blend_out));
        self.composite = None;
    }

    fn has_direct_player(&self) -> bool {
        self.direct.is_some()
    }

    fn retarget_direct(&mut self, asset: &AnimationAsset, looping: bool, rate: f32) {
        self.calls.push(PlaybackCall::RetargetDirect {
            asset: asset.handle().clone(),
            looping,
            rate,
        });
        self.start_direct(asset, looping, rate);
    }

    fn play_direct(&mut self, asset: &AnimationAsset, looping: bool, rate: f32) {
        self.calls.push(PlaybackCall::PlayDirect {
            asset: asset.handle().clone(),
            looping,
            rate,
        });
        self.start_direct(asset, looping, rate);
    }

    fn stop_direct(&mut self) {
        self.calls.push(PlaybackCall::StopDirect);
        if let Some(d) = &mut self.direct {
            d.playing = false;
        }
    }

    fn set_direct_play_rate(&mut self, rate: f32) {
        self.calls.push(PlaybackCall::SetDirectPlayRate(rate));
        if let Some(d) = &mut self.direct {
            d.rate = rate;
        }
    }

    fn direct_position(&self) -> Option<f32> {
        self.direct.as_ref().map(|d| d.position)
    }

    fn set_direct_position(&mut self, position: f32) {
        self.calls.push(PlaybackCall::SetDirectPosition(position));
        if let Some(d) = &mut self.direct {
            d.position = position;
        }
    }

    fn find_ability_node(&self, state_machine: &str, state: &str) -> Option<NodeRef> {
        self.nodes
            .get(&(state_machine.to_string(), state.to_string()))
            .copied()
    }

    fn node_play(
        &mut self,
        node: NodeRef,
        clip: &ClipAsset,
        rate: f32,
        _blend_in: AlphaBlend,
        _blend_out: AlphaBlend,
    ) {
        self.calls.push(PlaybackCall::NodePlay {
            node,
            clip: clip.handle.clone(),
            rate,
        });
        if let Some(state) = self.node_states.get_mut(&node) {
            state.clip = Some(clip.handle.clone());
            state.rate = rate;
            state.time = 0.0;
        }
    }

    fn node_abort(&mut self, node: NodeRef, clear_queue: bool) {
        self.calls.push(PlaybackCall::NodeAbort { node, clear_queue });
        if let Some(state) = self.node_states.get_mut(&node) {
            state.clip = None;
        }
    }

    fn node_set_time(&mut self, node: NodeRef, time: f32) {
        self.calls.push(PlaybackCall::NodeSetTime { node, time });
        if let Some(state) = self.node_states.get_mut(&node) {
            state.time = time;
        }
    }

    fn node_set_play_rate(&mut self, node: NodeRef, rate: f32) {
        self.calls.push(PlaybackCall::NodeSetPlayRate { node, rate });
        if let Some(state) = self.node_states.get_mut(&node) {
            state.rate = rate;
        }
    }

    fn visibility_tick(&self) -> VisibilityTick {
        self.visibility_tick
    }

    fn set_visibility_tick(&mut self, tick: VisibilityTick) {
        self.calls.push(PlaybackCall::SetVisibilityTick(tick));
        self.visibility_tick = tick;
    }

    fn request_tick(&mut self, reason: &str, enabled: bool) {
        self.calls.push(PlaybackCall::RequestTick {
            reason: reason.to_string(),
            enabled,
        });
        self.tick_requested = enabled;
    }
}
