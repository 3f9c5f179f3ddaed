mod config;
mod dispatcher;
mod models;
mod server;
mod template;
mod ticket;

use anyhow::Context;
use clap::Parser;
use config::Config;
use dispatcher::Dispatcher;
use models::{tracker::CommandExecutor, youtrack::YouTrackClient};
use server::AppState;
use std::{future::IntoFuture, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::{signal, sync::watch};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// How long in-flight deliveries may keep running once shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ----------------------------------------------------------------------
// 1  Command line
// ----------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(author, version, about = "Relays GitHub webhook events to YouTrack commands")]
struct Cli {
    /// Base URL of the YouTrack instance
    #[arg(long, env = "YOUTRACK_URL")]
    youtrack_url: String,

    /// Permanent token used as bearer token
    #[arg(long, env = "YOUTRACK_TOKEN", hide_env_values = true)]
    youtrack_token: String,

    /// Event → command mapping file (JSON or YAML)
    #[arg(long, env = "ACTION_MAPPINGS_CONFIG", default_value = "action_mappings.json")]
    mappings: PathBuf,

    /// Seconds a single YouTrack command may take before it counts as failed
    #[arg(long, env = "YOUTRACK_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout: u64,

    /// Port (Default 8080)
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

// ----------------------------------------------------------------------
// 2  Startup
// ----------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a) Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // b) CLI and settings
    let cli = Cli::parse();
    let config = Config::new(cli.port, &cli.youtrack_url, &cli.youtrack_token, cli.mappings)?;
    debug!("Starting with configuration: {:?}", config);

    // c) Mapping table and tracker client
    let mapping = Arc::new(config::load_mappings(&config.mappings_path)?);
    let executor: Arc<dyn CommandExecutor> = Arc::new(
        YouTrackClient::new(
            &config.youtrack_url,
            config.youtrack_token.clone(),
            Duration::from_secs(cli.request_timeout),
        )
        .context("failed to build the YouTrack client")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stopping = shutdown_rx.clone();
    let dispatcher = Dispatcher::new(mapping, executor).with_shutdown(shutdown_rx);
    let state = Arc::new(AppState {
        dispatcher: Arc::new(dispatcher),
    });

    // d) Server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}/webhook");

    let serve = axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .into_future();
    server::drain_with_deadline(serve, stopping, SHUTDOWN_GRACE)
        .await
        .context("server error")?;

    info!("Server exited properly");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM and tells the dispatcher to stop issuing commands.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
    shutdown.send_replace(true);
}
