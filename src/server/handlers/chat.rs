use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::providers::deepseek::client::{error_for_status, truncate_for_log};
use crate::server::AppState;
use crate::server::credential::header_credential;
use crate::server::passthrough::stream_passthrough;

/// `POST /v1/chat/completions`: OpenAI-shaped in, DeepSeek upstream, streamed or buffered out.
pub async fn chat_completions(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = header_credential(&headers).ok_or_else(|| {
        GatewayError::MissingCredential("Missing or invalid Authorization header".into())
    })?;

    let request = parse_chat_request(&body)?;
    let upstream_req = app_state.translator.to_upstream(request);
    let stream = upstream_req
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let model = upstream_req
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    tracing::info!(model = %model, stream, key = %credential, "Proxying request to DeepSeek");

    let timeout = app_state.config.upstream.chat_timeout();
    let response = app_state
        .client
        .chat_completions(credential.expose(), &upstream_req, stream, timeout)
        .await
        .inspect_err(|e| tracing::error!(model = %model, error = %e, "Request error"))?;

    let response = error_for_status(response, timeout).await.inspect_err(|e| {
        if let GatewayError::UpstreamStatus { status, body } = e {
            tracing::error!(
                model = %model,
                status,
                body = %truncate_for_log(body),
                "DeepSeek API error"
            );
        }
    })?;

    if stream {
        return Ok(stream_passthrough(response, model));
    }

    let upstream_body = response.json::<Value>().await.map_err(|e| {
        tracing::error!(model = %model, error = %e, "Unexpected error in chat completions");
        GatewayError::Internal(e.to_string())
    })?;
    Ok(Json(app_state.translator.to_caller(upstream_body)).into_response())
}

/// Non-empty JSON object, or `MalformedRequest`.
fn parse_chat_request(body: &[u8]) -> Result<Map<String, Value>, GatewayError> {
    let malformed = || GatewayError::MalformedRequest("Request body is required".into());
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(_) => Err(malformed()),
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable chat request body");
            Err(malformed())
        }
    }
}
