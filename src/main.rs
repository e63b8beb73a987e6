//! MindMate - chat-based mental-health assistant
//!
//! A Rust backend implementing a per-session conversation state machine
//! that offers a therapist chat, medical report summaries and a mood journal.

mod api;
mod companion;
mod document;
mod journal;
mod llm;
mod prompt;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use journal::JsonlJournal;
use llm::LlmConfig;
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
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
                .unwrap_or_else(|_| "mindmate=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let journal_path = std::env::var("MINDMATE_JOURNAL_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.mindmate/journal.jsonl")
    });

    let port: u16 = std::env::var("MINDMATE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let session_idle_secs: u64 = std::env::var("MINDMATE_SESSION_IDLE_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);

    let journal = JsonlJournal::new(&journal_path);
    tracing::info!(path = %journal.path().display(), "Journal file configured");

    // Initialize LLM service
    let llm_config = LlmConfig::from_env();
    if llm_config.has_api_key() {
        tracing::info!(model = %llm_config.model, "OPENAI_API_KEY loaded");
    } else {
        tracing::warn!("OPENAI_API_KEY is not set. Therapist chat and report summaries will fail.");
    }
    let llm_service = llm::build_service(&llm_config);

    // Create application state
    let state = AppState::new(RuntimeManager::production(journal, llm_service));
    if session_idle_secs > 0 {
        state
            .runtime
            .spawn_idle_sweeper(Duration::from_secs(session_idle_secs));
        tracing::info!(idle_secs = session_idle_secs, "Idle session sweeper started");
    }

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("MindMate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
