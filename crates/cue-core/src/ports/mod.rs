//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait はホスト側の協力者（ワールド、アセット、ターゲット探索、
//! 動的バインディング）へのインターフェースで、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - コアは「いつ」実行されるかを決めない（スケジューラの責務）
//! - エンティティ・コンポーネントは ID で弱参照し、毎回生存確認する

pub mod world;
pub mod assets;
pub mod targeting;
pub mod binding;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::world::{
    CompositePlay, NodeRef, PlaybackComponent, RotationDriver, SlotPlay, TurnInPlace, World,
};
pub use self::assets::AssetResolver;
pub use self::targeting::TargetingRule;
pub use self::binding::BindingResolver;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
