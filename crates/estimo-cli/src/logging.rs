//! Logging setup using tracing + tracing-subscriber.
//!
//! Logs go to stderr so stdout only carries protocol JSON.

use anyhow::{Context, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = build_env_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

/// RUST_LOG wins over the CLI level.
fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))
}
