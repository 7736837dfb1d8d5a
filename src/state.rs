use crate::config::AppConfig;
use crate::services::conversation::Engine;
use crate::store::{ReservationSink, SessionStore};

pub struct AppState {
    pub config: AppConfig,
    pub engine: Engine,
    pub sessions: Box<dyn SessionStore>,
    pub reservations: Box<dyn ReservationSink>,
}
