mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;
mod tailoring;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::LlmResumeAnalyzer;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::HttpAnalysisStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("refinecv_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RefineCV API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (rejects an empty credential up front)
    let llm = LlmClient::new(&config.ai_base_url, &config.ai_api_key, &config.ai_model)?;
    info!("LLM client initialized (model: {})", config.ai_model);

    // Initialize storage backend client
    let store = HttpAnalysisStore::new(&config.storage_base_url, &config.storage_api_key);
    info!("Analysis store initialized");

    // Build app state
    let state = AppState {
        analyzer: Arc::new(LlmResumeAnalyzer::new(llm)),
        store: Arc::new(store),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
