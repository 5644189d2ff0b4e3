//! Super Lotto - 6/45 draw simulator with an LLM fortune teller
//!
//! A Rust backend owning the draw session state machine and serving it
//! over HTTP and server-sent events.

mod api;
mod config;
mod credential;
mod db;
mod draw;
mod fortune;
mod llm;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use credential::{Credentials, DatabaseCredentialStore};
use db::Database;
use fortune::FortuneClient;
use llm::LlmConfig;
use runtime::{spawn_session, ThreadRngDrawer};
use state_machine::DrawContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lotto_fortune=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env();
    let llm_config = LlmConfig::from_env();
    let context = DrawContext::default();
    context.validate()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let credentials = Arc::new(Credentials::new(
        Arc::new(DatabaseCredentialStore::new(db)),
        llm_config.gemini_api_key.as_deref(),
    ));
    match credentials.current_source() {
        Some(source) => tracing::info!(?source, "API key available"),
        None => tracing::warn!("No API key configured. Set GEMINI_API_KEY or submit one."),
    }
    tracing::info!(
        model = %llm_config.model,
        gateway = ?llm_config.gateway,
        "Fortune model configured"
    );

    // Start the session runtime
    let session = spawn_session(
        context,
        ThreadRngDrawer,
        FortuneClient::new(&llm_config),
        credentials,
    );
    let state = AppState::new(session);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Super Lotto server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
