//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! Task / Invocation / Entity / Component はすべて ULID を使います。
//! `Id<T>` で共通実装を持ち、`T` はマーカー型（PhantomData）として
//! コンパイル時に種類の取り違えを防ぎます。
//!
//! Entity と Component は「弱参照」です。ID 自体は所有権を持たず、
//! 使うたびに `World` 側で生存確認をします。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "inv-", ...）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let task_id: TaskId = Id::from(Ulid::new());
/// let entity: EntityId = Id::from(Ulid::new());
/// // task_id と entity は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// テスト・デモ用: 連番から決定的な Id を作る
    pub fn from_u128(value: u128) -> Self {
        Self::from_ulid(Ulid::from_bytes(value.to_be_bytes()))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task (configured behaviour) のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Invocation (one timeline of a skill use) のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Invocation {}

impl IdMarker for Invocation {
    fn prefix() -> &'static str {
        "inv-"
    }
}

/// Entity のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {}

impl IdMarker for Entity {
    fn prefix() -> &'static str {
        "ent-"
    }
}

/// Playback component のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {}

impl IdMarker for Component {
    fn prefix() -> &'static str {
        "cmp-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of a configured task inside a skill.
pub type TaskId = Id<Task>;

/// Identifier of one invocation (context) of a skill.
pub type InvocationId = Id<Invocation>;

/// Weak, non-owning reference to an entity in the host world.
pub type EntityId = Id<Entity>;

/// Weak, non-owning reference to a playback component in the host world.
pub type ComponentId = Id<Component>;
