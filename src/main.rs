//! SkyNET CLI entry point.
//!
//! Provides `run`, which hosts the built-in echo participant over JSON lines
//! on stdin/stdout, and `summary`, which prints the trace line for a
//! workitem file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use skynet::config::SkynetConfig;
use skynet::echo::EchoHandler;
use skynet::logging::{self, LoggingGuard};
use skynet::participant::{workitem_summary, ParticipantAdapter};
use skynet::runner::ParticipantRunner;
use skynet::transport::{stdio, ChannelTransport, Transport};
use skynet::workitem::WorkItem;

/// SkyNET: workflow engine participant adapter.
#[derive(Parser)]
#[command(name = "skynet", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the echo participant, reading deliveries from stdin.
    Run {
        /// Config file (defaults to `$SKYNET_CONFIG_PATH` or `./skynet.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the trace summary line of a workitem JSON file.
    Summary {
        /// Path to the workitem JSON.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let result = runtime.block_on(handle_run(config.as_deref()));
            // The stdin reader may still sit in a blocking read; don't wait for EOF.
            runtime.shutdown_background();
            result
        }
        Command::Summary { file } => handle_summary(&file),
    }
}

/// Print the summary of one workitem file.
fn handle_summary(file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let workitem = WorkItem::from_json(&raw)
        .with_context(|| format!("{} is not a workitem", file.display()))?;
    println!("{}", workitem_summary(&workitem));
    Ok(())
}

/// Run the echo participant until stdin closes, a stop arrives, or Ctrl-C.
async fn handle_run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = SkynetConfig::load(config_path).context("failed to load configuration")?;
    let _logging_guard = init_logging(&config)?;

    let participant = &config.participant;
    info!(participant = %participant.name, queue = %participant.reply_queue, "SkyNET starting");

    let (transport, replies) = ChannelTransport::new(participant.reply_queue.clone());
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let adapter = ParticipantAdapter::new(
        participant.name.clone(),
        Arc::new(EchoHandler::new()),
        transport,
    )
    .context("failed to attach echo handler")?;

    let writer = tokio::spawn(stdio::write_replies(replies, tokio::io::stdout()));

    let (delivery_tx, delivery_rx) = mpsc::channel(participant.channel_buffer_size.max(1));
    let reader = tokio::spawn(stdio::read_deliveries(
        BufReader::new(tokio::io::stdin()),
        delivery_tx,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            // Receiver may already be gone if the runner finished first.
            let _ = shutdown_tx.send(true);
        }
    });

    let report = ParticipantRunner::new(Arc::new(adapter))
        .with_shutdown_timeout(participant.shutdown_timeout())
        .run(delivery_rx, shutdown_rx)
        .await;
    reader.abort();

    // The runner owned the last transport handle apart from in-flight echo
    // tasks, so the writer ends once those replies are flushed.
    match tokio::time::timeout(participant.shutdown_timeout(), writer).await {
        Ok(Ok(Ok(written))) => info!(written, "reply stream flushed"),
        Ok(Ok(Err(e))) => warn!(error = %e, "reply stream failed"),
        Ok(Err(e)) => warn!(error = %e, "reply writer panicked"),
        Err(_) => warn!("reply stream did not flush in time"),
    }

    info!(exit = ?report.exit, consumed = report.consumed, "SkyNET stopped");
    Ok(())
}

/// File logging when `logs_dir` is configured, stderr otherwise.
fn init_logging(config: &SkynetConfig) -> anyhow::Result<Option<LoggingGuard>> {
    let level = &config.logging.level;
    match &config.logging.logs_dir {
        Some(dir) => logging::init_production(dir, level).map(Some),
        None => logging::init_cli(level).map(|()| None),
    }
}
