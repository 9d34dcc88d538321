//! InMemoryAssets - 開発用のアセットリゾルバ
//!
//! 事前に登録した記述子を返すだけ。JSON から読むこともできます。

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::asset::{AnimationAsset, AssetHandle, SharedAsset};
use crate::ports::AssetResolver;

#[derive(Debug, Default, Clone)]
pub struct InMemoryAssets {
    assets: HashMap<AssetHandle, SharedAsset>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AnimationAsset) {
        self.assets.insert(asset.handle().clone(), Arc::new(asset));
    }

    pub fn with(mut self, asset: AnimationAsset) -> Self {
        self.insert(asset);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<AnimationAsset> for InMemoryAssets {
    fn from_iter<I: IntoIterator<Item = AnimationAsset>>(iter: I) -> Self {
        let mut assets = Self::new();
        for asset in iter {
            assets.insert(asset);
        }
        assets
    }
}

impl AssetResolver for InMemoryAssets {
    fn resolve(&self, handle: &AssetHandle) -> Option<SharedAsset> {
        self.assets.get(handle).cloned()
    }
}
