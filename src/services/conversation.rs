use chrono::Utc;

use crate::config::BotMode;
use crate::services::ai::extraction::FieldExtractor;
use crate::services::dialogue::{self, Turn};
use crate::services::assistant;
use crate::state::AppState;

/// Which dialogue drives the conversation.
pub enum Engine {
    Guided,
    Assistant(Box<dyn FieldExtractor>),
}

impl Engine {
    pub fn mode(&self) -> BotMode {
        match self {
            Engine::Guided => BotMode::Guided,
            Engine::Assistant(_) => BotMode::Assistant,
        }
    }
}

/// Handles one inbound message: load session, step, commit, persist.
///
/// A confirmed reservation is written before the session is saved, so a
/// failing sink leaves the user at the confirmation step.
pub async fn process_message(
    state: &AppState,
    user_id: &str,
    message: &str,
) -> anyhow::Result<Turn> {
    let session = state.sessions.get(user_id)?;
    let previous = session.state;

    let mut turn = match &state.engine {
        Engine::Guided => dialogue::step(session, message),
        Engine::Assistant(extractor) => {
            assistant::step(session, message, extractor.as_ref()).await
        }
    };

    tracing::info!(
        user = user_id,
        from_state = previous.as_str(),
        to_state = turn.session.state.as_str(),
        "processed message"
    );

    if let Some(data) = &turn.commit {
        let reservation = state.reservations.commit(user_id, data)?;
        tracing::info!(
            user = user_id,
            reservation_id = %reservation.id,
            cancha = %reservation.cancha,
            fecha = %reservation.fecha,
            "reservation committed"
        );
    }

    turn.session.updated_at = Utc::now().naive_utc();
    state.sessions.put(&turn.session)?;

    Ok(turn)
}
