//! Small value types shared by tasks and the playback port.

use serde::{Deserialize, Serialize};

use super::asset::AssetHandle;

/// Blend-in / blend-out pair used when playing a composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendTimes {
    pub blend_in: f32,
    pub blend_out: f32,
}

impl Default for BlendTimes {
    fn default() -> Self {
        Self {
            blend_in: 0.25,
            blend_out: 0.25,
        }
    }
}

/// Blend used by the graph node when transitioning clips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBlend {
    pub blend_time: f32,
}

impl Default for AlphaBlend {
    fn default() -> Self {
        Self { blend_time: 0.2 }
    }
}

/// When a playback component keeps ticking while off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityTick {
    #[default]
    AlwaysTickPoseAndRefreshBones,
    AlwaysTickPose,
    OnlyTickMontagesWhenNotRendered,
    OnlyTickPoseWhenRendered,
}

/// How a playback component is currently driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Routed through the entity's standing animation graph.
    #[default]
    GraphDriven,

    /// Ad-hoc, direct playback bypassing the graph.
    Direct,
}

/// A value produced by a dynamic binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Name(Option<String>),
    Blend(BlendTimes),
    Asset(AssetHandle),
}
