//! API сервер: анонимизация CSV и оценка полезности приватных моделей

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dp_utility::{
    api::{router, AppState},
    ServerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::parse();
    let addr = config.addr;
    let state = AppState::new(config);
    state
        .store()
        .ensure_dir()
        .await
        .with_context(|| format!("creating upload directory {}", state.store().dir().display()))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
