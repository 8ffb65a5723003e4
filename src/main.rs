use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use social_admin_api::{agent::AgentClient, app, config, store::{MemoryStore, Store}, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, AGENT_SERVICE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Read once; the router gets its own owned copy
    let config = config::config().clone();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Social Admin API in {:?} mode", config.environment);

    let store = Arc::new(MemoryStore::new());
    store.connect().await.context("failed to connect store")?;

    let agents = AgentClient::new(&config.agent).context("failed to build agent service client")?;
    tracing::info!(agent_service = %agents.base_url(), "agent service client ready");

    let port = config.server.port;
    let state = AppState::new(Arc::new(config), store.clone(), Arc::new(agents));

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Social Admin API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server failure")?;

    store.close().await.context("failed to close store")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
