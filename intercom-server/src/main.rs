//! intercom-server - Main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intercom_server::api::{self, AppContext};
use intercom_server::config::{Config, ConfigOverrides};
use intercom_server::device::{DeviceTrigger, HttpDeviceTrigger};
use intercom_server::playback::{self, CommandQueue, Dispatcher};
use intercom_server::SharedState;

/// Command-line arguments for intercom-server
#[derive(Parser, Debug)]
#[command(name = "intercom-server")]
#[command(about = "Playback dispatcher for networked intercoms")]
#[command(version)]
struct Args {
    /// Port for the HTTP API
    #[arg(short, long, env = "INTERCOM_PORT")]
    port: Option<u16>,

    /// Path to the SQLite catalog database
    #[arg(short, long, env = "INTERCOM_DATABASE")]
    database: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(ConfigOverrides {
        config_path: args.config,
        database_path: args.database,
        port: args.port,
    })
    .await
    .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "intercom-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database: {}", config.database_path.display());

    let db_pool = intercom_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let queue = CommandQueue::new();
    let reset = playback::startup_reset(&db_pool, &queue)
        .await
        .context("Failed to clear pending commands")?;
    info!("Startup reset: {} pending commands removed", reset.commands_deleted);

    let trigger: Arc<dyn DeviceTrigger> = Arc::new(
        HttpDeviceTrigger::new(config.dispatch.device_timeout())
            .map_err(intercom_server::Error::from)
            .context("Failed to build device client")?,
    );
    let state = Arc::new(SharedState::new());

    let shutdown = CancellationToken::new();
    let dispatcher = Dispatcher::new(
        db_pool.clone(),
        queue.clone(),
        Arc::clone(&trigger),
        Arc::clone(&state),
        config.dispatch.timing(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(shutdown.clone()));

    let ctx = AppContext {
        db_pool,
        queue,
        trigger,
        state,
    };

    let served = api::run(&config, ctx, shutdown_signal()).await;

    // The dispatcher finishes its current command before seeing this
    info!("Waiting for dispatcher to reach the queue");
    shutdown.cancel();
    if let Err(e) = dispatcher_task.await {
        error!("Dispatcher task failed: {}", e);
    }

    served.context("HTTP server failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
