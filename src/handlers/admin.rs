use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/reservations
#[derive(Deserialize)]
pub struct ReservationsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    id: String,
    user_id: String,
    nombre: String,
    cedula: String,
    telefono: String,
    cancha: String,
    fecha: String,
    hora: String,
    created_at: String,
}

pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ReservationsQuery>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).min(500);
    let reservations = state
        .reservations
        .recent(limit)
        .map_err(AppError::storage)?
        .ok_or_else(|| AppError::NotFound("reservation log is not queryable".to_string()))?;

    let response = reservations
        .into_iter()
        .map(|r| ReservationResponse {
            id: r.id,
            user_id: r.user_id,
            nombre: r.nombre,
            cedula: r.cedula,
            telefono: r.telefono,
            cancha: r.cancha,
            fecha: r.fecha,
            hora: r.hora,
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}
