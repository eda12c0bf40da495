//! estimo-core
//!
//! Asynchronous Monte Carlo π estimation with a submit/poll protocol.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, precision, state, record, job, errors）
//! - **kernel**: Monte Carlo estimator と小数丸め
//! - **progress**: kernel から worker への progress channel
//! - **ports**: 抽象化レイヤー（TaskStore, DeliveryQueue, IdGenerator, Clock）
//! - **impls**: 実装（InMemoryTaskStore, InMemoryDeliveryQueue）
//! - **app**: アプリケーションロジック（builder, protocol, worker_loop, handler）

pub mod app;
pub mod domain;
pub mod impls;
pub mod kernel;
pub mod ports;
pub mod progress;
