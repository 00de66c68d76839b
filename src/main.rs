use health_tracker::{
    auth::TokenAuth, llm::GatewayClient, router, AppConfig, AppState, JsonFileStore,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let store = JsonFileStore::open(config.data_path.clone()).await;
    info!("using data file {}", store.path().display());

    if config.tokens.is_empty() {
        warn!("APP_TOKENS is empty; every request will be rejected as unauthenticated");
    }
    if config.gateway.api_key.is_none() {
        warn!("AI_GATEWAY_API_KEY is not set; free-form chat messages will fail");
    }

    let assistant = GatewayClient::new(config.gateway.clone())?;
    let state = AppState::new(
        Arc::new(store),
        Arc::new(assistant),
        TokenAuth::new(config.tokens.clone()),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
