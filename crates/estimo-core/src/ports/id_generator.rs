//! IdGenerator port - ID 生成の抽象化
//!
//! submit は並行に呼ばれるので、調整なしで一意な ID を作れる ULID を使います。
//!
//! # 実装
//! - **UlidGenerator**: Clock の時刻 + 80-bit の乱数

use crate::domain::ids::{DeliveryId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は task handle と delivery id を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の submit / broker から使える）
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_delivery_id(&self) -> DeliveryId;
}

/// UlidGenerator は ULID ベースの ID 生成器
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_delivery_id(&self) -> DeliveryId {
        DeliveryId::from(self.next_ulid())
    }
}
