use crate::models::{DialogueState, Field, ReservationData, Session};
use crate::services::replies;
use crate::services::validation;

pub const RESET_TOKEN: &str = "0";

const RESERVE_ALIASES: &[&str] = &["1", "reservar", "reserva"];
const INFO_ALIASES: &[&str] = &["2", "info", "informacion", "información"];
const HELP_ALIASES: &[&str] = &["3", "ayuda", "help"];

/// Outcome of one dialogue step.
#[derive(Debug, Clone)]
pub struct Turn {
    pub session: Session,
    pub reply: String,
    /// Set when the user confirmed; the caller must persist it before saving the session.
    pub commit: Option<ReservationData>,
}

impl Turn {
    pub fn reply(session: Session, reply: impl Into<String>) -> Self {
        Self {
            session,
            reply: reply.into(),
            commit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Reserve,
    Info,
    Help,
}

pub fn menu_choice(input: &str) -> Option<MenuChoice> {
    if RESERVE_ALIASES.contains(&input) {
        Some(MenuChoice::Reserve)
    } else if INFO_ALIASES.contains(&input) {
        Some(MenuChoice::Info)
    } else if HELP_ALIASES.contains(&input) {
        Some(MenuChoice::Help)
    } else {
        None
    }
}

/// Collecting state for each field, in the order they are asked.
fn collecting_state(field: Field) -> DialogueState {
    match field {
        Field::Nombre => DialogueState::Name,
        Field::Cedula => DialogueState::Cedula,
        Field::Telefono => DialogueState::Phone,
        Field::Cancha => DialogueState::Court,
        Field::Fecha => DialogueState::Date,
        Field::Hora => DialogueState::Time,
    }
}

fn collected_field(state: DialogueState) -> Option<Field> {
    match state {
        DialogueState::Name => Some(Field::Nombre),
        DialogueState::Cedula => Some(Field::Cedula),
        DialogueState::Phone => Some(Field::Telefono),
        DialogueState::Court => Some(Field::Cancha),
        DialogueState::Date => Some(Field::Fecha),
        DialogueState::Time => Some(Field::Hora),
        _ => None,
    }
}

fn next_field(field: Field) -> Option<Field> {
    let idx = Field::ALL.iter().position(|f| *f == field)?;
    Field::ALL.get(idx + 1).copied()
}

/// Runs one step of the guided dialogue.
pub fn step(mut session: Session, input: &str) -> Turn {
    let input = input.trim();

    if input == RESET_TOKEN {
        session.reset();
        return Turn::reply(session, replies::reset());
    }

    match session.state {
        DialogueState::Menu => match menu_choice(input) {
            Some(MenuChoice::Reserve) => {
                session.state = DialogueState::Name;
                Turn::reply(session, replies::ASK_NAME)
            }
            Some(MenuChoice::Info) => Turn::reply(session, replies::INFO),
            Some(MenuChoice::Help) => Turn::reply(session, replies::HELP),
            None => Turn::reply(session, replies::unrecognized_option()),
        },
        DialogueState::Confirm => confirm_step(session, input),
        state => match collected_field(state) {
            Some(field) => collect_step(session, field, input),
            None => safety_reset(session),
        },
    }
}

fn collect_step(mut session: Session, field: Field, input: &str) -> Turn {
    let Some(value) = validation::validate(field, input) else {
        return Turn::reply(session, replies::invalid(field));
    };
    session.data.set(field, value);

    match next_field(field) {
        Some(next) => {
            session.state = collecting_state(next);
            Turn::reply(session, replies::ask(next))
        }
        None if session.data.is_complete() => {
            session.state = DialogueState::Confirm;
            let summary = replies::summary(&session.data);
            Turn::reply(session, summary)
        }
        // Reached the last field with gaps left behind by a corrupted record.
        None => safety_reset(session),
    }
}

/// Shared by both bot modes: `1` commits, `2` cancels. Any other input hands
/// the session back untouched.
pub fn confirm_choice(session: Session, input: &str) -> Result<Turn, Session> {
    match input {
        "1" => Ok(commit(session)),
        "2" => Ok(cancel(session)),
        _ => Err(session),
    }
}

pub fn commit(mut session: Session) -> Turn {
    let data = std::mem::take(&mut session.data);
    session.reset();
    Turn {
        session,
        reply: replies::committed(),
        commit: Some(data),
    }
}

pub fn cancel(mut session: Session) -> Turn {
    session.reset();
    Turn::reply(session, replies::cancelled())
}

fn confirm_step(session: Session, input: &str) -> Turn {
    if !session.data.is_complete() {
        return safety_reset(session);
    }
    confirm_choice(session, input)
        .unwrap_or_else(|session| Turn::reply(session, replies::INVALID_CONFIRM))
}

pub fn safety_reset(mut session: Session) -> Turn {
    tracing::warn!(
        user = %session.id,
        state = session.state.as_str(),
        "unexpected dialogue state, resetting session"
    );
    session.reset();
    Turn::reply(session, replies::safety_reset())
}
