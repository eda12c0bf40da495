//! Impls - ports のプロセス内実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: task handle registry
//! - **InMemoryDeliveryQueue**: at-least-once の配送キュー
//!
//! 外部の broker / KV store を使う場合は、同じ ports を実装した別クレートを
//! `AppBuilder` に渡します。

pub mod inmem_delivery;
pub mod inmem_store;

pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::inmem_store::InMemoryTaskStore;
