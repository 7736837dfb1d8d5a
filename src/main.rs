use std::sync::{Arc, Mutex};

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use puntoas::config::{AppConfig, LlmBackend, SessionBackend};
use puntoas::db;
use puntoas::handlers;
use puntoas::services::ai::extraction::LlmExtractor;
use puntoas::services::ai::ollama::OllamaProvider;
use puntoas::services::ai::openai::OpenAiCompatProvider;
use puntoas::services::ai::LlmProvider;
use puntoas::services::conversation::Engine;
use puntoas::state::AppState;
use puntoas::store::{
    FileReservationSink, MemorySessionStore, ReservationSink, SessionStore,
    SqliteReservationSink, SqliteSessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let db = if config.uses_database() {
        tracing::info!("opening database at {}", config.database_url);
        Some(Arc::new(Mutex::new(db::init_db(&config.database_url)?)))
    } else {
        None
    };

    let sessions: Box<dyn SessionStore> = match (config.session_backend, &db) {
        (SessionBackend::Sqlite, Some(db)) => Box::new(SqliteSessionStore::new(db.clone())),
        _ => {
            tracing::warn!("sessions kept in memory; they are lost on restart");
            Box::new(MemorySessionStore::new())
        }
    };

    let reservations: Box<dyn ReservationSink> = match (&config.reservations_file, &db) {
        (Some(path), _) => {
            tracing::info!("appending reservations to {path}");
            Box::new(FileReservationSink::new(path))
        }
        (None, Some(db)) => Box::new(SqliteReservationSink::new(db.clone())),
        (None, None) => anyhow::bail!("no reservation sink configured"),
    };

    let engine = match &config.llm {
        Some(llm) => {
            let provider: Box<dyn LlmProvider> = match llm.backend {
                LlmBackend::OpenAi => {
                    tracing::info!("using chat completions provider at {} (model: {})", llm.base_url, llm.model);
                    Box::new(OpenAiCompatProvider::new(
                        llm.base_url.clone(),
                        llm.api_key.clone(),
                        llm.model.clone(),
                        llm.timeout,
                    )?)
                }
                LlmBackend::Ollama => {
                    tracing::info!("using Ollama provider at {} (model: {})", llm.base_url, llm.model);
                    Box::new(OllamaProvider::new(
                        llm.base_url.clone(),
                        llm.model.clone(),
                        llm.timeout,
                    )?)
                }
            };
            Engine::Assistant(Box::new(LlmExtractor::new(provider)))
        }
        None => Engine::Guided,
    };

    if config.twilio_auth_token.is_empty() {
        tracing::warn!("TWILIO_AUTH_TOKEN not set, webhook signatures are not checked");
    }

    tracing::info!(mode = engine.mode().as_str(), "bot engine ready");

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        engine,
        sessions,
        reservations,
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
