//! Animation asset descriptors.
//!
//! Assets are loaded by the host; the engine only consumes resolved
//! descriptors and asks them for lengths and sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Path-like handle the host uses to resolve an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A plain, unsectioned clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipAsset {
    pub handle: AssetHandle,
    pub length: f32,
}

/// One named section of a composite clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSection {
    pub name: String,
    pub start_time: f32,
    pub length: f32,
}

/// A composite clip made of independently addressable sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeAsset {
    pub handle: AssetHandle,
    pub sections: Vec<CompositeSection>,
}

impl CompositeAsset {
    /// Index of `name`, or `None` when the composite has no such section.
    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    pub fn section(&self, index: usize) -> Option<&CompositeSection> {
        self.sections.get(index)
    }

    pub fn section_length(&self, index: usize) -> Option<f32> {
        self.section(index).map(|s| s.length)
    }

    pub fn is_valid_section_name(&self, name: &str) -> bool {
        self.section_index(name).is_some()
    }

    /// Full playable length: the furthest section end.
    pub fn play_length(&self) -> f32 {
        self.sections
            .iter()
            .map(|s| s.start_time + s.length)
            .fold(0.0, f32::max)
    }
}

/// A resolved animation asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationAsset {
    Clip(ClipAsset),
    Composite(CompositeAsset),
}

impl AnimationAsset {
    pub fn handle(&self) -> &AssetHandle {
        match self {
            AnimationAsset::Clip(c) => &c.handle,
            AnimationAsset::Composite(c) => &c.handle,
        }
    }

    pub fn play_length(&self) -> f32 {
        match self {
            AnimationAsset::Clip(c) => c.length,
            AnimationAsset::Composite(c) => c.play_length(),
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeAsset> {
        match self {
            AnimationAsset::Composite(c) => Some(c),
            AnimationAsset::Clip(_) => None,
        }
    }

    pub fn as_clip(&self) -> Option<&ClipAsset> {
        match self {
            AnimationAsset::Clip(c) => Some(c),
            AnimationAsset::Composite(_) => None,
        }
    }
}

/// Shared, read-only resolved asset.
pub type SharedAsset = Arc<AnimationAsset>;

#[cfg(test)]
mod tests {
    use super::*;

    fn attack() -> CompositeAsset {
        CompositeAsset {
            handle: AssetHandle::new("Attack01"),
            sections: vec![
                CompositeSection {
                    name: "Windup".into(),
                    start_time: 0.0,
                    length: 1.2,
                },
                CompositeSection {
                    name: "Recover".into(),
                    start_time: 1.2,
                    length: 0.4,
                },
            ],
        }
    }

    #[test]
    fn missing_section_is_not_found() {
        let c = attack();
        assert_eq!(c.section_index("Recover"), Some(1));
        assert_eq!(c.section_index("Nope"), None);
        assert!(!c.is_valid_section_name("Nope"));
        assert_eq!(c.section_length(5), None);
    }

    #[test]
    fn play_length_is_furthest_section_end() {
        let c = attack();
        assert!((c.play_length() - 1.6).abs() < 1e-6);
    }

    #[test]
    fn asset_is_tagged_enum() {
        let a = AnimationAsset::Clip(ClipAsset {
            handle: AssetHandle::new("Idle"),
            length: 2.0,
        });
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["kind"], "clip");
        assert_eq!(v["handle"], "Idle");
    }
}
