use anyhow::Context;

use crate::config::config;
use crate::handlers::{router, AppState};
use crate::is_production;
use crate::store;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting IIoT Objects API in {:?} mode", config.environment);

    let store = store::connect(&config.database)
        .await
        .context("failed to open object store")?;
    if is_production!() && store.backend() == "memory" {
        tracing::warn!("Production mode with the in-memory store, objects will not survive a restart");
    }

    let app = router(AppState::new(store, config));

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("IIoT Objects API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
