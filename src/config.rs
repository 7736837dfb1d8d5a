use std::env;
use std::time::Duration;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotMode {
    /// Fixed question-per-field dialogue.
    Guided,
    /// Free-form dialogue backed by LLM field extraction.
    Assistant,
}

impl BotMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotMode::Guided => "guided",
            BotMode::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions (OpenAI, Groq).
    OpenAi,
    Ollama,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub bot_mode: BotMode,
    pub session_backend: SessionBackend,
    /// Append reservations to this text file instead of the database.
    pub reservations_file: Option<String>,
    /// Bearer token for the reservation listing; empty disables it.
    pub admin_token: String,
    pub dev_endpoints: bool,
    /// Empty skips webhook signature validation.
    pub twilio_auth_token: String,
    /// Public webhook URL as configured in Twilio, used for signature checks
    /// when the service sits behind a proxy that rewrites the host.
    pub webhook_public_url: Option<String>,
    /// Present only in assistant mode.
    pub llm: Option<LlmConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {p}")))?,
            None => 5000,
        };

        let bot_mode = match var("BOT_MODE").as_deref() {
            None | Some("guided") => BotMode::Guided,
            Some("assistant") => BotMode::Assistant,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "BOT_MODE must be guided or assistant, got {other}"
                )))
            }
        };

        let session_backend = match var("SESSION_STORE").as_deref() {
            None | Some("sqlite") => SessionBackend::Sqlite,
            Some("memory") => SessionBackend::Memory,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "SESSION_STORE must be sqlite or memory, got {other}"
                )))
            }
        };

        let llm = match bot_mode {
            BotMode::Assistant => Some(llm_config(&var)?),
            BotMode::Guided => None,
        };

        Ok(Self {
            port,
            database_url: var("DATABASE_URL").unwrap_or_else(|| "puntoas.db".to_string()),
            bot_mode,
            session_backend,
            reservations_file: var("RESERVATIONS_FILE"),
            admin_token: var("ADMIN_TOKEN").unwrap_or_default(),
            dev_endpoints: matches!(var("DEV_ENDPOINTS").as_deref(), Some("1" | "true")),
            twilio_auth_token: var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            webhook_public_url: var("WEBHOOK_PUBLIC_URL"),
            llm,
        })
    }

    /// Whether anything is configured to live in the SQLite database.
    pub fn uses_database(&self) -> bool {
        self.session_backend == SessionBackend::Sqlite || self.reservations_file.is_none()
    }
}

fn llm_config(var: &dyn Fn(&str) -> Option<String>) -> Result<LlmConfig, AppError> {
    let timeout_secs = match var("LLM_TIMEOUT_SECS") {
        Some(s) => s
            .parse::<u64>()
            .map_err(|_| AppError::Config(format!("LLM_TIMEOUT_SECS is not a number: {s}")))?,
        None => 30,
    };
    let timeout = Duration::from_secs(timeout_secs);

    let provider = var("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string());
    let (backend, default_url, default_model) = match provider.as_str() {
        "openai" => (LlmBackend::OpenAi, "https://api.openai.com/v1", "gpt-4o-mini"),
        "groq" => (
            LlmBackend::OpenAi,
            "https://api.groq.com/openai/v1",
            "llama-3.1-8b-instant",
        ),
        "ollama" => (LlmBackend::Ollama, "http://localhost:11434", "llama3.2"),
        other => {
            return Err(AppError::Config(format!(
                "LLM_PROVIDER must be openai, groq or ollama, got {other}"
            )))
        }
    };

    let api_key = var("LLM_API_KEY").unwrap_or_default();
    if backend == LlmBackend::OpenAi && api_key.is_empty() {
        return Err(AppError::Config(format!(
            "LLM_API_KEY must be set when BOT_MODE=assistant and LLM_PROVIDER={provider}"
        )));
    }

    let base_url = match backend {
        LlmBackend::Ollama => var("OLLAMA_URL").or_else(|| var("LLM_BASE_URL")),
        LlmBackend::OpenAi => var("LLM_BASE_URL"),
    }
    .unwrap_or_else(|| default_url.to_string());

    Ok(LlmConfig {
        backend,
        api_key,
        base_url,
        model: var("LLM_MODEL").unwrap_or_else(|| default_model.to_string()),
        timeout,
    })
}
