//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **TaskService**: submit / poll / health の入口
//! - **WorkerGroup**: タスク実行ループ（lease→claim→kernel→succeed/fail→ack）
//! - **MonteCarloHandler**: kernel を job 1 件分実行する

pub mod builder;
pub mod config;
pub mod handler;
pub mod protocol;
pub mod worker_loop;


// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::config::RuntimeConfig;
pub use self::handler::{Handler, MonteCarloHandler};
pub use self::protocol::{
    ApiError, ErrorBody, HealthReport, PollResponse, PollState, SubmitResponse, TaskService,
};
pub use self::worker_loop::{WorkerContext, WorkerGroup};
