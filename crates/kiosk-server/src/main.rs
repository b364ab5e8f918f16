//! kiosk-server binary: receives storage notifications and runs load units.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use kiosk_core::jsonl::JsonlWarehouse;
use kiosk_core::observability::{init_logging, log_format_from_env};
use kiosk_core::storage::{ObjectStoreBackend, StorageBackend};
use kiosk_core::warehouse::Warehouse;
use kiosk_loader::{Dispatcher, Loader, LoaderConfig};
use kiosk_server::{AppState, router};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(log_format_from_env());

    let config = LoaderConfig::from_env().context("loader configuration")?;
    let warehouse_dir = std::env::var("KIOSK_WAREHOUSE_DIR")
        .context("missing KIOSK_WAREHOUSE_DIR")?;
    let port = resolve_port()?;

    let storage: Arc<dyn StorageBackend> =
        Arc::new(ObjectStoreBackend::from_bucket(&config.bucket)?);
    let warehouse: Arc<dyn Warehouse> = Arc::new(JsonlWarehouse::new(warehouse_dir));

    let loader = Loader::new(storage, warehouse, config);
    loader.ensure_tables().await.context("ensure tables")?;

    let state = Arc::new(AppState {
        dispatcher: Dispatcher::new(loader),
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "kiosk-server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind")?;
    axum::serve(listener, app).await.context("server error")
}

fn resolve_port() -> Result<u16> {
    if let Ok(port) = std::env::var("PORT") {
        return port.parse::<u16>().context("invalid PORT");
    }
    if let Ok(port) = std::env::var("KIOSK_PORT") {
        return port.parse::<u16>().context("invalid KIOSK_PORT");
    }
    Ok(8080)
}
