//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - builds the single writer and the source client
//! - runs the scheduler (or one cycle) on a single-threaded runtime
//! - closes the writer on SIGINT/SIGTERM and picks the exit code

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::{Command, OnceArgs, RunArgs};
use crate::config::{Config, log_format_from_env};
use crate::data::{AesoClient, GridSource};
use crate::error::AppError;
use crate::sink::{InfluxWriter, MemoryWriter, PointWriter};

pub mod pipeline;
pub mod scheduler;

use scheduler::Scheduler;

/// Entry point for the `grid-ingest` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    let config = Config::from_env();
    let log_format = match &config {
        Ok(c) => c.log_format,
        Err(_) => log_format_from_env(),
    };
    crate::telemetry::init(log_format);
    let config = config?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(2, format!("Failed to start runtime: {e}")))?;

    runtime.block_on(async move {
        match cli.command {
            None => handle_run(config, RunArgs::default()).await,
            Some(Command::Run(args)) => handle_run(config, args).await,
            Some(Command::Once(args)) => handle_once(config, args).await,
        }
    })
}

async fn handle_run(mut config: Config, args: RunArgs) -> Result<(), AppError> {
    if let Some(secs) = args.interval {
        config.schedule.interval = Duration::from_secs(secs);
    }

    let writer: Arc<dyn PointWriter> = Arc::new(InfluxWriter::new(&config.influx)?);
    let source: Arc<dyn GridSource> = Arc::new(AesoClient::new(&config.source)?);
    info!(
        source = %config.source.url,
        store = %config.influx.url,
        bucket = %config.influx.bucket,
        "starting ingestion"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let scheduler = Scheduler::new(&config.schedule).with_alignment(!args.no_align);
    serve(&scheduler, source, writer, shutdown).await
}

/// Run the schedule until `shutdown` fires, then close `writer`.
///
/// Returns an exit-code-1 error if closing the writer fails; failed cycles
/// never surface here.
pub async fn serve(
    scheduler: &Scheduler,
    source: Arc<dyn GridSource>,
    writer: Arc<dyn PointWriter>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let stats = scheduler.run(source, Arc::clone(&writer), shutdown).await;
    info!(
        started = stats.started,
        flushed = stats.flushed,
        failed = stats.failed,
        skipped = stats.skipped,
        aborted = stats.aborted,
        "scheduler stopped"
    );

    close_writer(writer.as_ref()).await
}

async fn handle_once(config: Config, args: OnceArgs) -> Result<(), AppError> {
    let source = AesoClient::new(&config.source)?;

    let report = if args.dry_run {
        let writer = MemoryWriter::new();
        let report = pipeline::run_cycle(&source, &writer).await;
        close_writer(&writer).await?;
        for line in writer.flushed_lines() {
            println!("{line}");
        }
        report
    } else {
        let writer = InfluxWriter::new(&config.influx)?;
        let report = pipeline::run_cycle(&source, &writer).await;
        close_writer(&writer).await?;
        report
    };

    match report.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Flush whatever is still buffered and release the writer.
///
/// A failure here is the only error that makes a long-running process exit non-zero.
async fn close_writer(writer: &dyn PointWriter) -> Result<(), AppError> {
    match writer.close().await {
        Ok(()) => {
            info!(writer = writer.name(), "writer closed");
            Ok(())
        }
        Err(e) => {
            error!(writer = writer.name(), error = %e, "error during shutdown");
            Err(e.into())
        }
    }
}

/// Cancel `token` on the first SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }

    token.cancel();
}
