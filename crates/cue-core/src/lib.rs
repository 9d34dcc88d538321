//! cue-core
//!
//! Core building blocks for timed skill tasks.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, realm, outcome, asset, params, math, target, invocation, errors）
//! - **ports**: 抽象化レイヤー（World, PlaybackComponent, AssetResolver, TargetingRule, BindingResolver, Clock, IdGenerator）
//! - **typed**: 型付き Task API（Task trait, ScratchPad, Bindable, RuleRegistry）
//! - **tasks**: 具体的なタスク（FindTarget, TurnTo, PlayAnimation）
//! - **app**: アプリケーション層（SkillBuilder, Runtime, TimelineDriver, config, status）
//! - **impls**: 実装（InMemoryWorld など開発用）
//!
//! # Lifecycle
//! ```text
//! start → tick* → end(result)
//! ```
//! 「いつ」呼ぶかはホストのスケジューラが決めます。コアは呼ばれたときに
//! 「何をするか」だけを持ちます。

pub mod domain;
pub mod ports;
pub mod typed;
pub mod tasks;
pub mod app;
pub mod impls;
