//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock のタイムスタンプ + 乱数で ULID を作る

use crate::domain::ids::{ComponentId, EntityId, InvocationId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;
    fn generate_invocation_id(&self) -> InvocationId;
    fn generate_entity_id(&self) -> EntityId;
    fn generate_component_id(&self) -> ComponentId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// FixedClock を使えばタイムスタンプ部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next())
    }

    fn generate_invocation_id(&self) -> InvocationId {
        InvocationId::from(self.next())
    }

    fn generate_entity_id(&self) -> EntityId {
        EntityId::from(self.next())
    }

    fn generate_component_id(&self) -> ComponentId {
        ComponentId::from(self.next())
    }
}
