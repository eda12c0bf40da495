//! estimo - run the π estimator from the command line.

mod cli;
mod logging;

use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use estimo_core::app::{AppBuilder, PollState};
use crate::cli::{Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.json_logs)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let outcome = rt.block_on(dispatch(cli.command));
    // an interrupted kernel may still be sampling on a blocking thread
    rt.shutdown_background();
    outcome
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => run(args).await,
        Commands::Health => {
            let app = AppBuilder::new().build()?;
            print_json(&app.service().health())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let app = AppBuilder::new().config(args.runtime_config()).build()?;
    let workers = app.start();

    let submitted = match app.service().submit(args.n).await {
        Ok(submitted) => submitted,
        Err(e) => {
            print_json(&e.body())?;
            workers.shutdown_and_join().await;
            bail!("submission rejected with status {}", e.status_code());
        }
    };
    print_json(&submitted)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.poll_interval_ms.max(1)));

    let last = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                warn!(task_id = %submitted.task_id, "interrupted before the task finished");
                break None;
            }
            _ = ticker.tick() => {
                let poll = app.service().poll(Some(submitted.task_id.as_str())).await?;
                print_json(&poll)?;
                if poll.state.is_terminal() {
                    break Some(poll);
                }
            }
        }
    };

    let counts = app.service().counts().await?;
    info!(
        pending = counts.pending,
        running = counts.running,
        succeeded = counts.succeeded,
        failed = counts.failed,
        "registry"
    );

    match last {
        Some(poll) => {
            workers.shutdown_and_join().await;
            if poll.state == PollState::Failed {
                bail!("task {} failed", submitted.task_id);
            }
        }
        None => workers.request_shutdown(),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
