mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod posts;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::posts::memory::MemoryPostStore;
use crate::posts::store::{PgPostStore, PostStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting postgen v{}", env!("CARGO_PKG_VERSION"));

    // Initialize post store
    let store: Arc<dyn PostStore> = match &config.store {
        StoreBackend::Postgres(options) => {
            let pool = create_pool(options.clone(), config.db_max_connections).await?;
            Arc::new(PgPostStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory post store; posts will not survive a restart");
            Arc::new(MemoryPostStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(&config.gemini)?;
    info!("LLM client initialized (endpoint: {})", llm.endpoint());

    let state = AppState {
        llm,
        store,
        response_shape: config.response_shape,
    };
    info!("/generate responds with {:?}", config.response_shape);

    let app = build_router(state, &config.static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
