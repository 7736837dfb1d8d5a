use std::sync::Arc;

use axum::extract::{OriginalUri, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

/// Twilio's signature: HMAC-SHA1 over the full URL followed by every POST
/// parameter as `key + value`, sorted by key, base64-encoded.
pub fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &[(String, String)],
) -> bool {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut data = url.to_string();
    for (key, value) in sorted {
        data.push_str(key);
        data.push_str(value);
    }

    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// URL Twilio signed: the configured public URL, or one rebuilt from the
/// forwarding headers.
fn signed_url(state: &AppState, headers: &HeaderMap, uri: &OriginalUri) -> String {
    if let Some(url) = &state.config.webhook_public_url {
        return url.clone();
    }
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let proto = header_str("x-forwarded-proto").unwrap_or("https");
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str("host"))
        .unwrap_or("localhost");
    let path = uri
        .0
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{proto}://{host}{path}")
}

pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: OriginalUri,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return Err(AppError::Forbidden("missing signature".to_string()));
        }

        let url = signed_url(&state, &headers, &uri);
        if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, &params) {
            tracing::warn!(url = %url, "invalid Twilio signature");
            return Err(AppError::Forbidden("invalid signature".to_string()));
        }
    }

    let from = param(&params, "From").unwrap_or("").trim().to_string();
    let body = param(&params, "Body").unwrap_or("").trim().to_string();

    if from.is_empty() {
        return Err(AppError::BadRequest("missing From".to_string()));
    }

    tracing::info!(from = %from, body = %body, "incoming message");

    let turn = conversation::process_message(&state, &from, &body)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, from = %from, "conversation processing failed");
            AppError::storage(e)
        })?;

    Ok(twiml_response(&turn.reply))
}

pub fn twiml(reply: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        quick_xml::escape::escape(reply)
    )
}

fn twiml_response(reply: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml(reply),
    )
        .into_response()
}
