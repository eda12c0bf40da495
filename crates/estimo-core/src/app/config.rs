//! Runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one in-process runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// How long a worker waits on the broker before checking for shutdown.
    pub lease_timeout_ms: u64,

    /// Seed for the estimator RNG. `None` draws from OS entropy per task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            lease_timeout_ms: 500,
            seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.lease_timeout_ms)
    }
}
