//! `irlinkd`: runs an IR transceiver board on a host.

mod config;

use anyhow::Context;
use clap::Parser;
use irlink_controller::{BoardController, BootConfig, HostPlatform, LoggingAdvertiser};
use irlink_hardware::devices::AnyIrBackend;
use irlink_hardware::mock::MockIrBackend;
use irlink_network::{HttpServer, HttpServerConfig, app_state};
use irlink_storage::{
    AnyKeyValueStore, Database, DatabaseConfig, MemoryKeyValueStore, SqliteKeyValueStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Args, FileConfig, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file.layer(args.overrides()))?;

    init_tracing(&settings.log_level);
    info!(
        version = irlink_core::VERSION,
        variant = %settings.board_variant,
        mac = %settings.mac_address,
        "Starting irlinkd"
    );

    let store = open_store(&settings).await?;

    let (backend, _ir) = MockIrBackend::new();
    warn!("No IR peripheral driver on this host, using the simulated backend");

    let controller = BoardController::boot(BootConfig {
        backend: AnyIrBackend::Mock(backend),
        store,
        pins: settings.board_variant.pin_table(),
        platform: Box::new(HostPlatform::new(settings.mac_address, settings.ip_address)),
        advertiser: Box::new(LoggingAdvertiser::new()),
        http_port: settings.bind_addr.port(),
    })
    .await;

    let server = HttpServer::bind(
        HttpServerConfig {
            bind_addr: settings.bind_addr,
        },
        app_state(controller),
    )
    .await
    .with_context(|| format!("binding {}", settings.bind_addr))?;

    server.serve_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_store(settings: &Settings) -> anyhow::Result<AnyKeyValueStore> {
    if settings.uses_memory_store() {
        warn!("Using the in-memory store, settings are lost on exit");
        return Ok(AnyKeyValueStore::Memory(MemoryKeyValueStore::new()));
    }

    let db = Database::new(DatabaseConfig::new(settings.database_path.clone()))
        .await
        .with_context(|| format!("opening database {}", settings.database_path))?;
    info!(path = %settings.database_path, "Settings database opened");
    Ok(AnyKeyValueStore::Sqlite(SqliteKeyValueStore::new(db)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
