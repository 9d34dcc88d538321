//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryWorld**: エンティティ・再生コンポーネントを持つ開発用ワールド
//! - **InMemoryPlayback**: 呼び出しを記録する再生コンポーネント
//! - **InMemoryAssets**: 登録済み記述子を返すアセットリゾルバ
//! - **FixedTargets / NearbyTargets / FnRule**: ターゲット探索ルール
//!
//! 本番用の実装（エンジン連携）はホスト側に置きます。

pub mod world;
pub mod playback;
pub mod assets;
pub mod rules;

// 主要な型を再エクスポート
pub use self::world::{InMemoryWorld, RecordingDriver, TurnState};
pub use self::playback::{InMemoryPlayback, PlaybackCall};
pub use self::assets::InMemoryAssets;
pub use self::rules::{FixedTargets, FnRule, NearbyTargets};
