use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

/// Local chat without Twilio: same pipeline as the webhook, plain JSON reply.
#[derive(Deserialize)]
pub struct DevMessage {
    pub from: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DevResponse {
    pub reply: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub committed: bool,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Result<Json<DevResponse>, AppError> {
    let from = payload.from.trim();
    if from.is_empty() {
        return Err(AppError::BadRequest("from must not be empty".to_string()));
    }

    let turn = conversation::process_message(&state, from, &payload.message)
        .await
        .map_err(AppError::storage)?;

    Ok(Json(DevResponse {
        reply: turn.reply,
        state: turn.session.state.as_str(),
        committed: turn.commit.is_some(),
    }))
}
