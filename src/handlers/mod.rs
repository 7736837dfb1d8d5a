pub mod admin;
pub mod dev;
pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/webhook", post(webhook::whatsapp_webhook))
        .route("/webhook/whatsapp", post(webhook::whatsapp_webhook))
        .route("/api/reservations", get(admin::list_reservations));

    if state.config.dev_endpoints {
        app = app.route("/api/dev/message", post(dev::send_message));
    }

    app.with_state(state)
}
