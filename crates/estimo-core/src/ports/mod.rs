//! Ports - 抽象化レイヤー
//!
//! 外部の collaborator（broker, state store）と時刻・ID 生成への
//! インターフェースを定義します。実装は `impls` にあります。

pub mod clock;
pub mod delivery_queue;
pub mod id_generator;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_queue::{DeliveryQueue, JobLease, QueueError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::{Claim, StoreError, TaskStore};
