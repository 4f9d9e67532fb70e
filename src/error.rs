use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    MissingCredential(String),

    #[error("{0}")]
    MalformedRequest(String),

    #[error("DeepSeek API error: {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Request failed: {0}")]
    UpstreamNetwork(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredential(_) => StatusCode::UNAUTHORIZED,
            GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::UpstreamNetwork(_)
            | GatewayError::Internal(_)
            | GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `error.type` tag rendered in the response envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential(_) => "authentication_error",
            GatewayError::MalformedRequest(_) => "invalid_request_error",
            GatewayError::UpstreamStatus { .. } => "api_error",
            GatewayError::UpstreamNetwork(_) => "request_error",
            GatewayError::Internal(_) | GatewayError::Config(_) => "internal_error",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::UpstreamNetwork(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Internal(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = json!({
            "message": self.to_string(),
            "type": self.error_type(),
        });
        if let GatewayError::UpstreamStatus { status: code, .. } = &self {
            error["code"] = json!(code);
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
