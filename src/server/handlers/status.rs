use axum::{extract::State, http::HeaderMap, response::Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;
use crate::server::handlers::session_credential;
use crate::server::util::external_base_url;

#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub proxy_url: String,
    pub models_endpoint: String,
    pub api_key_configured: bool,
    pub cache_valid: bool,
    pub cache_size: usize,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_connection: Option<bool>,
}

/// `GET /api/status`: endpoint URLs as seen by the caller plus cache and session state.
pub async fn status(State(app_state): State<Arc<AppState>>, headers: HeaderMap) -> Json<StatusInfo> {
    let base = external_base_url(&headers);
    let session = session_credential(&app_state, &headers).await;

    let api_connection = match &session {
        Some(credential) => Some(app_state.validator.validate(credential).await),
        None => None,
    };

    Json(StatusInfo {
        proxy_url: format!("{}/v1/chat/completions", base),
        models_endpoint: format!("{}/v1/models", base),
        api_key_configured: session.is_some(),
        cache_valid: app_state.model_cache.is_valid().await,
        cache_size: app_state.model_cache.len().await,
        timestamp: Utc::now().to_rfc3339(),
        api_connection,
    })
}
