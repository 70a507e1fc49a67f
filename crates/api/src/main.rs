mod app;
mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod exams;
    pub mod generate;
    pub mod groups;
    pub mod health;
    pub mod jobs;
    pub mod schedule;
    pub mod validate;
}

use anyhow::Context;
use jobs::InMemStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let store = InMemStore::new();
    if let Some(path) = &config.seed_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        store.seed_from_json(&raw)?;
    }
    let app_state = state::AppState::new(config, store)?;
    let app = app::router(app_state);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
