mod config;
mod http;

use anyhow::Context;
use clap::Parser;
use config::Config;
use medios_core::MediaAssistant;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Parse config
    let config = Config::parse();
    let assistant_config = config.load_assistant_config()?;

    info!("Starting Medios server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr);
    info!("Oracle model: {}", assistant_config.oracle.model);
    info!(
        "News relay: {}",
        assistant_config.news.relay_url.as_deref().unwrap_or("(direct)")
    );

    let assistant = MediaAssistant::from_config(&assistant_config)?;
    let state = http::AppState::with_max_slots(Arc::new(assistant), config.max_slots);
    let app = http::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", config.http_addr))?;

    info!("Medios server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
