use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::{GatewayError, Result as AppResult};
use crate::http_client::client_for_url;

use super::types::ModelListResponse;

const LOG_BODY_LIMIT: usize = 512;
const ERROR_BODY_LIMIT: usize = 64 * 1024;

/// Thin wrapper over the two upstream endpoints the gateway needs.
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeepSeekClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let http = client_for_url(base_url)
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /v1/models`. Non-success statuses become `UpstreamStatus`.
    pub async fn list_models(
        &self,
        api_key: &str,
        timeout: Duration,
    ) -> AppResult<ModelListResponse> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let response = error_for_status(response, timeout).await?;
        Ok(response.json::<ModelListResponse>().await?)
    }

    /// `POST /v1/chat/completions`.
    ///
    /// `timeout` bounds connect plus response headers. Non-streamed calls also get it
    /// as a whole-request deadline; streamed bodies are left open until upstream closes.
    /// The status is not checked here so the caller can choose how to surface it.
    pub async fn chat_completions(
        &self,
        api_key: &str,
        request: &Map<String, Value>,
        stream: bool,
        timeout: Duration,
    ) -> AppResult<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut builder = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request);
        if !stream {
            builder = builder.timeout(timeout);
        }

        match tokio::time::timeout(timeout, builder.send()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GatewayError::UpstreamNetwork(format!(
                "upstream did not respond within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Turns a non-success response into `UpstreamStatus`, keeping the body for diagnostics.
///
/// The body read stops at `ERROR_BODY_LIMIT` bytes or after `timeout`, whichever comes
/// first; whatever arrived by then is kept.
pub async fn error_for_status(
    mut response: reqwest::Response,
    timeout: Duration,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut buf = Vec::new();
    let read = async {
        while buf.len() < ERROR_BODY_LIMIT {
            match response.chunk().await {
                Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read upstream error body");
                    break;
                }
            }
        }
    };
    if tokio::time::timeout(timeout, read).await.is_err() {
        tracing::warn!(status = status.as_u16(), "Upstream error body stalled; giving up");
    }
    buf.truncate(ERROR_BODY_LIMIT);

    let body = String::from_utf8_lossy(&buf).into_owned();
    Err(GatewayError::UpstreamStatus {
        status: status.as_u16(),
        body,
    })
}

/// Caps upstream bodies before they reach the logs.
pub fn truncate_for_log(body: &str) -> &str {
    if body.len() <= LOG_BODY_LIMIT {
        return body;
    }
    let mut end = LOG_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
