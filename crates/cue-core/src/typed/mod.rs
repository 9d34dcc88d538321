//! Typed - タスク API
//!
//! # 二層構造
//! - **表層（Typed）**: `TypedScratchPad`（`const KIND`）, `Bindable<T>` - 型安全
//! - **内部（Dyn）**: `dyn Task`, `dyn ScratchPad` - object-safe, type erasure
//!
//! Scratch pad の種類とターゲット探索ルールは起動時に明示的に登録します。

pub mod task;
pub mod scratch;
pub mod bindable;
pub mod registry;

// 主要な trait/型 を再エクスポート
pub use self::task::{Task, TaskContext, TaskTiming};
pub use self::scratch::{ScratchPad, ScratchPadPool, TypedScratchPad};
pub use self::bindable::{Bindable, BindableValue, SkillBindings};
pub use self::registry::{RegistryError, RuleRegistry};
