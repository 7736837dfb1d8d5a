use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReservationData;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Menu,
    Name,
    Cedula,
    Phone,
    Court,
    Date,
    Time,
    Confirm,
    Chat,
    /// A stored state string that no longer maps to a known state.
    Unknown,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Menu => "menu",
            DialogueState::Name => "name",
            DialogueState::Cedula => "cedula",
            DialogueState::Phone => "phone",
            DialogueState::Court => "court",
            DialogueState::Date => "date",
            DialogueState::Time => "time",
            DialogueState::Confirm => "confirm",
            DialogueState::Chat => "chat",
            DialogueState::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "menu" => DialogueState::Menu,
            "name" => DialogueState::Name,
            "cedula" => DialogueState::Cedula,
            "phone" => DialogueState::Phone,
            "court" => DialogueState::Court,
            "date" => DialogueState::Date,
            "time" => DialogueState::Time,
            "confirm" => DialogueState::Confirm,
            "chat" => DialogueState::Chat,
            _ => DialogueState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: DialogueState,
    pub data: ReservationData,
    pub updated_at: NaiveDateTime,
}

impl Session {
    /// Fresh session sitting at the menu with no reservation data.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: DialogueState::Menu,
            data: ReservationData::default(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn reset(&mut self) {
        self.state = DialogueState::Menu;
        self.data = ReservationData::default();
    }

    /// True when the session is indistinguishable from a brand new one.
    pub fn is_pristine(&self) -> bool {
        self.state == DialogueState::Menu && self.data.is_empty()
    }
}
