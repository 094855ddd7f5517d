//! dccn-chair: conference chair backend
//!
//! Serves the chair dashboards, the review workflow and group messaging over
//! HTTP, and stores system notifications for submission status changes.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dccn_common::config::{
    config_file_path, LoggingConfig, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use dccn_common::db::init::init_database;
use dccn_common::notifier::run_notification_listener;
use dccn_common::EventBus;
use dccn_chair::{build_router, AppState};

const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "dccn-chair")]
#[command(about = "Conference chair backend", long_about = None)]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, env = "DCCN_PORT")]
    port: Option<u16>,

    /// Root folder holding dccn.db
    #[arg(short, long, env = "DCCN_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists, so a broken file is reported afterwards
    let (config, config_error) = match config_file_path() {
        Some(path) => match TomlConfig::load(&path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some(e)),
        },
        None => (TomlConfig::default(), None),
    };

    init_tracing(&config.logging)?;

    info!(
        "Starting DCCN chair backend (dccn-chair) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(e) = config_error {
        warn!("Ignoring config file: {}", e);
    }

    let root_folder = RootFolderResolver::new("chair")
        .with_cli_arg(args.root_folder)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .with_context(|| format!("creating {}", initializer.root_folder().display()))?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let events = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
    tokio::spawn(run_notification_listener(
        events.subscribe(),
        pool.clone(),
        config.notifications.clone(),
    ));

    let app = build_router(AppState::new(pool, events));

    let port = config.listen_port(args.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("dccn-chair listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("dccn-chair stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level; logs go to stdout unless a
/// log file is configured.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "dccn_chair={level},dccn_common={level},tower_http=info",
            level = logging.level
        )
        .into()
    });

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
