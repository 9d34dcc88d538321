//! AssetResolver port - アセット解決の抽象化
//!
//! ロード自体はホストの責務です。ここでは解決済みの記述子を受け取るだけ。

use crate::domain::asset::{AssetHandle, SharedAsset};

pub trait AssetResolver: Send + Sync {
    /// `None` when the asset failed to load or is neither clip nor composite.
    fn resolve(&self, handle: &AssetHandle) -> Option<SharedAsset>;
}
