//! Binary entry point for the todosync live list server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `todosync.yaml` and apply environment
//!    overrides
//! 2. Initialize structured logging (tracing)
//! 3. Open the item store (`PostgreSQL`, migrated on connect when
//!    configured, or in-memory)
//! 4. Serve HTTP and WebSocket traffic until `Ctrl-C`
//! 5. Close the database pool

mod error;

use std::path::Path;
use std::sync::Arc;

use todosync_db::{ItemStore, MemoryItemStore, PostgresPool};
use todosync_server::config::LoggingConfig;
use todosync_server::{AppState, StoreBackend, TodosyncConfig, shutdown_signal, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::DaemonError;

/// Default configuration file, resolved against the working directory.
const CONFIG_PATH: &str = "todosync.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the store, or the server fails.
#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let config = load_config()?;
    init_logging(&config.logging)?;

    info!(
        host = config.server.host,
        port = config.server.port,
        store = ?config.store.backend,
        outbound_buffer = config.sync.outbound_buffer,
        "todosync starting"
    );

    let (store, pool) = open_store(&config).await?;
    let state = Arc::new(AppState::new(store).with_outbound_buffer(config.sync.outbound_buffer));

    let served = start_server(&config.server.to_server_config(), state, shutdown_signal()).await;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }

    served?;
    info!("todosync stopped");
    Ok(())
}

/// Load `todosync.yaml` (or defaults) and apply environment overrides.
fn load_config() -> Result<TodosyncConfig, DaemonError> {
    let mut config = TodosyncConfig::load_or_default(Path::new(CONFIG_PATH))?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), DaemonError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| DaemonError::Logging {
        message: format!("{e}"),
    })
}

/// Open the configured item store.
///
/// Returns the pool alongside the store when `PostgreSQL` is used so it
/// can be closed on shutdown.
async fn open_store(
    config: &TodosyncConfig,
) -> Result<(ItemStore, Option<PostgresPool>), DaemonError> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory item store");
            Ok((MemoryItemStore::new().into(), None))
        }
        StoreBackend::Postgres => {
            let pool = PostgresPool::connect(&config.database).await?;
            Ok((pool.item_store().into(), Some(pool)))
        }
    }
}
