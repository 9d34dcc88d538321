//! App - アプリケーション層
//!
//! このモジュールは、ports と typed API を組み合わせてスキルを動かします。
//!
//! # 主要コンポーネント
//! - **SkillBuilder**: スキル（タスク一式）の構築とワイヤリング
//! - **Runtime**: スケジューラ → コアの lifecycle 表面
//! - **TimelineDriver**: 1 つの invocation を時間軸に沿って進める参照スケジューラ
//! - **Config**: スキル定義・ランタイム設定（JSON）
//! - **Status**: invocation の状態スナップショット

pub mod builder;
pub mod config;
pub mod runtime;
pub mod timeline;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, Skill, SkillBuilder};
pub use self::config::{ConfigError, RuntimeConfig, SkillSpec, TaskSpec};
pub use self::runtime::Runtime;
pub use self::timeline::TimelineDriver;
pub use self::status::{EndedTask, Status, TaskCounts};
