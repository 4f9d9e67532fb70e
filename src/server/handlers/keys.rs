use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::server::AppState;
use crate::server::credential::Credential;
use crate::server::util::is_secure;

#[derive(Debug, Deserialize)]
struct ValidateKeyRequest {
    api_key: Option<String>,
}

/// `POST /api/validate-key`: probes the key upstream and, when accepted, opens a session for it.
pub async fn validate_key(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let credential = serde_json::from_slice::<ValidateKeyRequest>(&body)
        .ok()
        .and_then(|r| r.api_key)
        .and_then(Credential::new);

    let Some(credential) = credential else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "error": "API key is required"})),
        )
            .into_response();
    };

    if !app_state.validator.validate(&credential).await {
        tracing::info!(key = %credential, "API key validation failed");
        return Json(json!({"valid": false, "error": "Invalid API key"})).into_response();
    }

    let token = app_state.sessions.create(credential.clone()).await;
    let secure = app_state.config.session.cookie_secure || is_secure(&headers);
    let cookie = app_state.sessions.cookie_header(&token, secure);
    tracing::info!(key = %credential, secure_cookie = secure, "API key validated, session issued");

    let mut resp = Json(json!({"valid": true, "message": "API key is valid"})).into_response();
    match HeaderValue::from_str(&cookie) {
        Ok(v) => {
            resp.headers_mut().insert(header::SET_COOKIE, v);
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode session cookie"),
    }
    resp
}
