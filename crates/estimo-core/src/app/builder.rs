//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 差し替えなければ in-memory 実装が使われる

use std::sync::Arc;

use tracing::info;

use super::config::RuntimeConfig;
use super::handler::{Handler, MonteCarloHandler};
use super::protocol::TaskService;
use super::worker_loop::{WorkerContext, WorkerGroup};
use crate::domain::EstimatorJob;
use crate::impls::{InMemoryDeliveryQueue, InMemoryTaskStore};
use crate::ports::{DeliveryQueue, IdGenerator, SystemClock, TaskStore, UlidGenerator};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(RuntimeConfig { workers: 2, ..Default::default() })
///     .build()?;
/// let workers = app.start();
/// let handle = app.service().submit(Some(5)).await?;
/// ```
///
/// # Fail-fast 設計
/// - worker 数 0 や lease timeout 0 は build() で弾く
#[derive(Default)]
pub struct AppBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn TaskStore>>,
    queue: Option<Arc<dyn DeliveryQueue>>,
    ids: Option<Arc<dyn IdGenerator>>,
    handler: Option<Arc<dyn Handler<EstimatorJob>>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("at least one worker is required")]
    NoWorkers,

    #[error("lease timeout must be greater than zero")]
    ZeroLeaseTimeout,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Handler を差し替える（既定は `MonteCarloHandler`）
    pub fn handler(mut self, handler: Arc<dyn Handler<EstimatorJob>>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// 設定を検証して App を生成
    pub fn build(self) -> Result<App, BuildError> {
        if self.config.workers == 0 {
            return Err(BuildError::NoWorkers);
        }
        if self.config.lease_timeout_ms == 0 {
            return Err(BuildError::ZeroLeaseTimeout);
        }

        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new()));
        let queue = self
            .queue
            .unwrap_or_else(|| Arc::new(InMemoryDeliveryQueue::new(Arc::clone(&ids))));
        let seed = self.config.seed;
        let handler = self.handler.unwrap_or_else(|| match seed {
            Some(seed) => Arc::new(MonteCarloHandler::with_seed(seed)),
            None => Arc::new(MonteCarloHandler::new()),
        });

        Ok(App {
            service: TaskService::new(Arc::clone(&store), Arc::clone(&queue), ids),
            workers: WorkerContext {
                store,
                queue,
                handler,
                lease_timeout: self.config.lease_timeout(),
            },
            config: self.config,
        })
    }
}

/// App はアプリケーションのランタイム
///
/// - `service()` が submit / poll の入口
/// - `start()` で worker group を起動する
pub struct App {
    config: RuntimeConfig,
    service: TaskService,
    workers: WorkerContext,
}

impl App {
    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Spawn `config.workers` workers. Must be called inside a tokio runtime.
    pub fn start(&self) -> WorkerGroup {
        info!(workers = self.config.workers, "starting workers");
        WorkerGroup::spawn(self.config.workers, self.workers.clone())
    }
}
