use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tower::ServiceExt;

use puntoas::config::AppConfig;
use puntoas::db;
use puntoas::handlers;
use puntoas::models::DialogueState;
use puntoas::services::ai::extraction::LlmExtractor;
use puntoas::services::ai::{LlmProvider, Message};
use puntoas::services::conversation::Engine;
use puntoas::state::AppState;
use puntoas::store::{
    MemoryReservationSink, ReservationSink, SqliteReservationSink, SqliteSessionStore,
};

// ── Mock Providers ──

/// Answers from the JSON payload's `user_message`.
struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let payload: serde_json::Value =
            serde_json::from_str(&messages.last().map(|m| m.content.clone()).unwrap_or_default())?;
        let text = payload["user_message"].as_str().unwrap_or("");

        if text.contains("reservar") {
            Ok("```json\n{\"intent\":\"reserve\",\"reply\":\"¿Cuál es tu cédula y teléfono?\",\"fields\":{\"nombre\":\"Maria Lopez\",\"cancha\":\"A\",\"fecha\":\"25/12/2025\",\"hora\":\"16h00-18h00\"},\"ready_to_confirm\":false}\n```".to_string())
        } else if text.contains("cédula") {
            Ok(r#"{"intent":"reserve","reply":"Gracias","fields":{"cedula":"1102234455","telefono":"0991234567"},"ready_to_confirm":true}"#.to_string())
        } else if text.contains("confirmo") {
            Ok(r#"{"intent":"confirm","reply":"Listo","fields":{}}"#.to_string())
        } else {
            Ok("Lo siento, no puedo ayudar con eso.".to_string())
        }
    }
}

// ── Helpers ──

fn test_config(pairs: &[(&str, &str)]) -> AppConfig {
    let mut vars: Vec<(String, String)> = vec![
        ("ADMIN_TOKEN".into(), "test-token".into()),
        ("DEV_ENDPOINTS".into(), "true".into()),
    ];
    vars.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    AppConfig::from_lookup(|k| {
        vars.iter()
            .rev()
            .find(|(key, _)| key == k)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

fn sqlite_state(config: AppConfig, engine: Engine) -> Arc<AppState> {
    let conn = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
    Arc::new(AppState {
        config,
        engine,
        sessions: Box::new(SqliteSessionStore::new(conn.clone())),
        reservations: Box::new(SqliteReservationSink::new(conn)),
    })
}

fn guided_state() -> Arc<AppState> {
    sqlite_state(test_config(&[]), Engine::Guided)
}

fn assistant_state() -> Arc<AppState> {
    sqlite_state(
        test_config(&[("BOT_MODE", "assistant"), ("LLM_API_KEY", "test")]),
        Engine::Assistant(Box::new(LlmExtractor::new(Box::new(MockLlm)))),
    )
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn form_encode(value: &str) -> String {
    let mut out = String::new();
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn webhook_request(from: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "From={}&Body={}&MessageSid=SM123",
            form_encode(from),
            form_encode(body)
        )))
        .unwrap()
}

async fn send(state: &Arc<AppState>, from: &str, body: &str) -> String {
    let res = test_app(state.clone())
        .oneshot(webhook_request(from, body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("content-type").unwrap(), "application/xml");
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get_json(state: &Arc<AppState>, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    let res = test_app(state.clone())
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

const USER: &str = "whatsapp:+593991234567";

// ── Guided Webhook Tests ──

#[tokio::test]
async fn test_webhook_replies_with_menu_twiml() {
    let state = guided_state();
    let xml = send(&state, USER, "hola").await;

    assert!(xml.contains("<Response><Message>"));
    assert!(xml.contains("No entendí"));
    assert!(xml.contains("Bot Punto AS - Reservas"));
}

#[tokio::test]
async fn test_full_guided_reservation() {
    let state = guided_state();
    let inputs = [
        "1",
        "Maria Lopez",
        "1102234455",
        "0991234567",
        "A",
        "25/12/2025",
        "16h00-18h00",
    ];
    let mut last = String::new();
    for input in inputs {
        last = send(&state, USER, input).await;
    }
    assert!(last.contains("Confirma tu reserva"));
    assert_eq!(
        state.sessions.get(USER).unwrap().state,
        DialogueState::Confirm
    );

    let xml = send(&state, USER, "1").await;
    assert!(xml.contains("Reserva registrada."));
    assert!(state.sessions.get(USER).unwrap().is_pristine());

    let (status, json) = get_json(&state, "/api/reservations", Some("test-token")).await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user_id"], USER);
    assert_eq!(list[0]["nombre"], "Maria Lopez");
    assert_eq!(list[0]["cedula"], "1102234455");
    assert_eq!(list[0]["telefono"], "0991234567");
    assert_eq!(list[0]["cancha"], "Básquet 3x3");
    assert_eq!(list[0]["fecha"], "25/12/2025");
    assert_eq!(list[0]["hora"], "16h00-18h00");
}

#[tokio::test]
async fn test_reset_token_mid_flow() {
    let state = guided_state();
    send(&state, USER, "1").await;
    send(&state, USER, "Maria Lopez").await;

    let xml = send(&state, USER, "0").await;
    assert!(xml.contains("Listo, reinicié el chat."));
    assert!(state.sessions.get(USER).unwrap().is_pristine());
}

#[tokio::test]
async fn test_invalid_field_reprompts() {
    let state = guided_state();
    send(&state, USER, "1").await;
    send(&state, USER, "Maria Lopez").await;

    let xml = send(&state, USER, "123").await;
    assert!(xml.contains("Cédula inválida."));
    assert_eq!(state.sessions.get(USER).unwrap().state, DialogueState::Cedula);
}

#[tokio::test]
async fn test_webhook_requires_sender() {
    let state = guided_state();
    let res = test_app(state)
        .oneshot(webhook_request("", "1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Signature Validation ──

fn signed_state() -> Arc<AppState> {
    sqlite_state(
        test_config(&[
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("WEBHOOK_PUBLIC_URL", "https://bot.example.com/webhook"),
        ]),
        Engine::Guided,
    )
}

#[tokio::test]
async fn test_webhook_rejects_missing_signature() {
    let res = test_app(signed_state())
        .oneshot(webhook_request(USER, "1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_accepts_valid_signature() {
    let state = signed_state();

    let data = format!("https://bot.example.com/webhookBody1From{USER}MessageSidSM123");
    let mut mac = Hmac::<Sha1>::new_from_slice(b"secret").unwrap();
    mac.update(data.as_bytes());
    let signature = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    let mut req = webhook_request(USER, "1");
    req.headers_mut()
        .insert("x-twilio-signature", signature.parse().unwrap());
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(state.sessions.get(USER).unwrap().state, DialogueState::Name);

    let mut req = webhook_request(USER, "2");
    req.headers_mut()
        .insert("x-twilio-signature", signature.parse().unwrap());
    let res = test_app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Assistant Mode ──

#[tokio::test]
async fn test_assistant_reservation_flow() {
    let state = assistant_state();

    let xml = send(&state, USER, "hola, quiero reservar la cancha A el 25/12/2025 de 16h00-18h00, soy Maria Lopez").await;
    assert!(xml.contains("¿Cuál es tu cédula y teléfono?"));
    assert_eq!(state.sessions.get(USER).unwrap().state, DialogueState::Chat);

    let xml = send(&state, USER, "mi cédula es 1102234455 y mi teléfono 0991234567").await;
    assert!(xml.contains("Confirma tu reserva"));

    let xml = send(&state, USER, "sí, confirmo").await;
    assert!(xml.contains("Reserva registrada."));
    assert!(state.sessions.get(USER).unwrap().is_pristine());

    let (_, json) = get_json(&state, "/api/reservations", Some("test-token")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["cancha"], "Básquet 3x3");
}

#[tokio::test]
async fn test_assistant_unparseable_model_output_falls_back() {
    let state = assistant_state();
    send(&state, USER, "1").await;

    let xml = send(&state, USER, "cuéntame un chiste").await;
    assert!(xml.contains("Tuve un problema entendiendo tu mensaje."));
    assert!(!xml.contains("Lo siento, no puedo ayudar"));
    assert_eq!(state.sessions.get(USER).unwrap().state, DialogueState::Menu);
}

// ── Health, Dev and Admin ──

#[tokio::test]
async fn test_health_reports_mode() {
    let (status, json) = get_json(&guided_state(), "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mode"], "guided");
}

#[tokio::test]
async fn test_dev_message_endpoint() {
    let state = guided_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dev/message")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"from":"dev-user","message":"1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["state"], "name");
    assert!(json["reply"].as_str().unwrap().contains("nombre completo"));
}

#[tokio::test]
async fn test_dev_endpoint_disabled_by_default() {
    let mut config = test_config(&[]);
    config.dev_endpoints = false;
    let state = sqlite_state(config, Engine::Guided);
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dev/message")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"from":"dev-user","message":"1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reservations_require_auth() {
    let state = guided_state();
    let (status, _) = get_json(&state, "/api/reservations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = get_json(&state, "/api/reservations", Some("wrong-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reservations_listing_from_memory_sink() {
    let sink = MemoryReservationSink::new();
    let data = puntoas::models::ReservationData {
        nombre: Some("Juan Perez".into()),
        cedula: Some("0912345678".into()),
        telefono: Some("0987654321".into()),
        cancha: Some("Ecuavóley/Vóley sala".into()),
        fecha: Some("01/01/2026".into()),
        hora: Some("08h00-10h00".into()),
    };
    sink.commit("u9", &data).unwrap();

    let conn = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
    let state = Arc::new(AppState {
        config: test_config(&[]),
        engine: Engine::Guided,
        sessions: Box::new(SqliteSessionStore::new(conn)),
        reservations: Box::new(sink),
    });

    let (status, json) = get_json(&state, "/api/reservations?limit=5", Some("test-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["nombre"], "Juan Perez");
}
