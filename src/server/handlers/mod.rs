use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;
use crate::server::credential::Credential;
use crate::server::session::SESSION_COOKIE;
use crate::server::util::cookie_value;

mod chat;
mod index;
mod keys;
mod models;
mod status;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index::index))
        // Operator page API
        .route("/api/validate-key", post(keys::validate_key))
        .route("/api/models", get(models::list_models_for_caller))
        .route("/api/status", get(status::status))
        // OpenAI-compatible surface
        .route("/v1/models", get(models::list_models_openai))
        .route("/v1/chat/completions", post(chat::chat_completions))
}

/// Credential stored by a previous successful key validation, if the cookie checks out.
pub(crate) async fn session_credential(app_state: &AppState, headers: &HeaderMap) -> Option<Credential> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    app_state.sessions.resolve(&token).await
}
