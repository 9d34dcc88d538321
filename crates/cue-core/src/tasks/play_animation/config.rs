//! Authoring-time configuration of the animation task.

use serde::{Deserialize, Serialize};

use crate::domain::asset::AssetHandle;
use crate::domain::params::{AlphaBlend, BlendTimes, VisibilityTick};
use crate::domain::target::{TargetKind, default_self};
use crate::typed::{Bindable, TaskTiming};

/// Playback backend. Every routine that cares matches on all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Direct playback that bypasses the animation graph.
    SingleNode,

    /// Playback through a dedicated node of the graph. Plain clips only.
    AbilityAnimationNode,

    /// Composite playback, or a plain clip wrapped as a composite on a slot.
    #[default]
    DynamicMontage,
}

impl AnimationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationMode::SingleNode => "single_node",
            AnimationMode::AbilityAnimationNode => "ability_animation_node",
            AnimationMode::DynamicMontage => "dynamic_montage",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayAnimationConfig {
    #[serde(flatten)]
    pub timing: TaskTiming,

    pub targets: Vec<TargetKind>,

    pub animation: Bindable<Option<AssetHandle>>,
    pub mode: AnimationMode,

    /// Passed to the world when choosing a playback component.
    pub event_name: Option<String>,

    pub section: Bindable<Option<String>>,

    /// Section to jump to when an interrupted composite is stopped.
    pub on_end_section: Bindable<Option<String>>,

    // ---- ability animation node ----
    pub state_machine_name: Bindable<String>,
    pub ability_state_name: Bindable<String>,
    pub blend_in: AlphaBlend,
    pub blend_out: AlphaBlend,

    // ---- dynamic montage ----
    pub slot_name: Bindable<String>,
    pub play_blend: Bindable<BlendTimes>,
    pub start_at: Bindable<f32>,

    /// Negative means "use the blend-out time".
    pub blend_out_trigger_time: Bindable<f32>,
    pub number_of_loops: Bindable<i32>,
    pub stop_all_composites: Bindable<bool>,

    // ---- playback ----
    #[serde(rename = "loop")]
    pub looping: bool,
    pub play_rate: Bindable<f32>,
    pub scale_with_ability_rate: bool,

    // ---- duration ----
    /// Use the configured end time instead of the asset's length.
    pub manual_length: bool,
    pub manual_length_is_interrupt: bool,

    // ---- cleanup ----
    pub stop_on_interrupt: bool,
    pub stop_on_branch: bool,
    pub clear_queued_on_interrupt: bool,
    pub reset_state_on_end: bool,

    // ---- realm / off-screen ticking ----
    pub play_on_server: bool,
    pub override_visibility_tick: bool,
    pub visibility_tick: VisibilityTick,
}

impl Default for PlayAnimationConfig {
    fn default() -> Self {
        Self {
            timing: TaskTiming::default(),
            targets: default_self(),
            animation: Bindable::new(None),
            mode: AnimationMode::DynamicMontage,
            event_name: None,
            section: Bindable::new(None),
            on_end_section: Bindable::new(None),
            state_machine_name: Bindable::new(String::new()),
            ability_state_name: Bindable::new(String::new()),
            blend_in: AlphaBlend::default(),
            blend_out: AlphaBlend::default(),
            slot_name: Bindable::new("DefaultSlot".to_string()),
            play_blend: Bindable::new(BlendTimes::default()),
            start_at: Bindable::new(0.0),
            blend_out_trigger_time: Bindable::new(-1.0),
            number_of_loops: Bindable::new(1),
            stop_all_composites: Bindable::new(false),
            looping: false,
            play_rate: Bindable::new(1.0),
            scale_with_ability_rate: true,
            manual_length: false,
            manual_length_is_interrupt: true,
            stop_on_interrupt: true,
            stop_on_branch: false,
            clear_queued_on_interrupt: false,
            reset_state_on_end: false,
            play_on_server: false,
            override_visibility_tick: false,
            visibility_tick: VisibilityTick::default(),
        }
    }
}

impl PlayAnimationConfig {
    pub fn with_animation(mut self, handle: impl Into<String>) -> Self {
        self.animation = Bindable::new(Some(AssetHandle::new(handle)));
        self
    }

    pub fn with_mode(mut self, mode: AnimationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Bindable::new(Some(section.into()));
        self
    }

    pub fn with_play_rate(mut self, rate: f32) -> Self {
        self.play_rate = Bindable::new(rate);
        self
    }

    pub fn with_timing(mut self, start_time: f32, end_time: f32) -> Self {
        self.timing = TaskTiming::new(start_time, end_time);
        self
    }
}
