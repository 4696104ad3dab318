//! punchsync - pushes biometric attendance records to the payroll service

mod context;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use punchsync_core::TokenProvider;
use punchsync_domain::{SyncKind, SyncProgress};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use context::AppContext;

/// punchsync: biometric timesheet push to payroll
#[derive(Parser, Debug)]
#[command(name = "punchsync")]
#[command(about = "Push locally captured time-in/time-out records to the payroll service")]
struct Args {
    /// Config file (JSON or TOML); probed in standard locations when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push all unsynced records
    Push,
    /// Log in with the stored credentials and report the result
    TestConnection,
    /// Return failed records to the backlog
    ResetFailed,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let dotenv = dotenvy::dotenv();

    let config_path = config_source(args.config.clone());
    let config = punchsync_infra::config::load(config_path.clone())
        .context("failed to load configuration")?;
    logging::init(&config.logging, args.verbose)?;

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    match &config_path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no config file found; using defaults and environment"),
    }

    let context = AppContext::new(config).await.context("failed to initialise local store")?;

    match args.command {
        Command::Push => push(&context).await,
        Command::TestConnection => test_connection(&context).await,
        Command::ResetFailed => reset_failed(&context).await,
    }
}

async fn push(context: &AppContext) -> anyhow::Result<ExitCode> {
    let cancellation = CancellationToken::new();
    let interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current batch");
            interrupt.cancel();
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let progress_task = tokio::spawn(log_progress(rx));

    let service = context.push_service(Arc::new(tx), cancellation);
    let report = service.push().await;
    drop(service);
    join_progress_logger(progress_task).await;

    if let Ok(Some(last)) = context.store.get_last_sync_time(SyncKind::Push).await {
        info!(last_sync = %last.to_rfc3339(), "last push time");
    }

    if report.success && report.stats.failed == 0 {
        info!(message = %report.message, "push finished");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(message = %report.message, "push finished with failures");
        Ok(ExitCode::FAILURE)
    }
}

/// Explicit `--config` path, else the first probed config file.
fn config_source(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(punchsync_infra::config::probe_config_paths)
}

async fn join_progress_logger(task: JoinHandle<()>) {
    if let Err(err) = task.await {
        warn!(error = %err, "progress logger stopped abnormally");
    }
}

async fn log_progress(mut rx: mpsc::UnboundedReceiver<SyncProgress>) {
    while let Some(event) = rx.recv().await {
        if event.completed {
            info!(success = event.success, failed = event.failed, "all batches processed");
        } else {
            info!(
                batch = event.batch_current,
                of = event.batch_total,
                size = event.batch_size,
                success = event.success,
                failed = event.failed,
                "sending batch"
            );
        }
    }
}

async fn test_connection(context: &AppContext) -> anyhow::Result<ExitCode> {
    let status = context.tokens.test_connection().await;
    if status.connected {
        info!(message = %status.message, "payroll connection ok");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(message = %status.message, "payroll connection failed");
        Ok(ExitCode::FAILURE)
    }
}

async fn reset_failed(context: &AppContext) -> anyhow::Result<ExitCode> {
    let reset = context.store.reset_failed_timesheets().await?;
    info!(reset, "failed records returned to the backlog");
    Ok(ExitCode::SUCCESS)
}
