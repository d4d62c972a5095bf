mod config;
mod error;
mod extract;
mod groq;
mod huggingface;
mod image_source;
mod models;
mod pexels;
mod proxy;
mod routes;

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    if config.groq_api_key.is_none() {
        tracing::warn!("⚠️ GROQ_API_KEY not set, /api/generate will fail");
    }
    if config.huggingface_api_key.is_none() {
        tracing::warn!("⚠️ HUGGINGFACE_API_KEY not set, /api/generate-image will fail");
    }
    tracing::info!(timeout = ?config.upstream_timeout, "Upstream timeout configured");

    let app = router(AppState::from_config(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
