//! Command line definition.

use clap::{Args, Parser, Subcommand};
use estimo_core::app::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(name = "estimo", version, about = "Estimate π by Monte Carlo sampling, submit/poll style")]
pub struct Cli {
    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true, env = "ESTIMO_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "ESTIMO_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit one estimation and print poll responses until it finishes
    Run(RunArgs),

    /// Print the health report
    Health,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Number of decimal places (1-200)
    #[arg(short = 'n', long = "digits", allow_negative_numbers = true)]
    pub n: Option<i64>,

    #[arg(long, env = "ESTIMO_WORKERS", default_value_t = 4)]
    pub workers: usize,

    #[arg(long, env = "ESTIMO_LEASE_TIMEOUT_MS", default_value_t = 500)]
    pub lease_timeout_ms: u64,

    /// Fixed RNG seed for reproducible estimates
    #[arg(long, env = "ESTIMO_SEED")]
    pub seed: Option<u64>,

    /// Delay between polls
    #[arg(long, env = "ESTIMO_POLL_INTERVAL_MS", default_value_t = 200)]
    pub poll_interval_ms: u64,
}

impl RunArgs {
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            workers: self.workers,
            lease_timeout_ms: self.lease_timeout_ms,
            seed: self.seed,
        }
    }
}
