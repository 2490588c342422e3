//! HTTP Basic authentication for the dashboard and API.
//!
//! Only the password is checked; any username is accepted.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::warn;

use crate::app::AppState;

const CHALLENGE: &str = "Basic realm=\"Dashboard\"";

pub async fn basic_auth(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let expected = match state.config.auth.dashboard_password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return next.run(req).await,
    };

    match basic_password(req.headers()) {
        None => challenge("Authentication required"),
        Some(password) if password == expected => next.run(req).await,
        Some(_) => {
            warn!(path = %req.uri().path(), "rejected dashboard credentials");
            challenge("Invalid credentials")
        }
    }
}

/// Password from an `Authorization: Basic` header. A malformed value yields
/// an empty password so it is rejected as invalid rather than missing.
fn basic_password(headers: &HeaderMap) -> Option<String> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default();
    let password = decoded
        .split_once(':')
        .map(|(_, password)| password.to_string())
        .unwrap_or_default();
    Some(password)
}

fn challenge(message: &str) -> Response {
    let mut resp = (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
    resp.headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    resp
}
