use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::providers::deepseek::Model;
use crate::server::AppState;
use crate::server::credential::{header_credential, resolve_credential};
use crate::server::handlers::session_credential;
use crate::server::model_cache::ModelSource;

/// First `fetch` parameter wins; anything other than `true` (any case) means no refresh.
fn force_refresh(params: &[(String, String)]) -> bool {
    params
        .iter()
        .find(|(k, _)| k == "fetch")
        .is_some_and(|(_, v)| v.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Serialize)]
pub struct CallerModelList {
    pub data: Vec<Model>,
    pub source: ModelSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenAIModelList {
    pub object: &'static str,
    pub data: Vec<Model>,
}

/// `GET /api/models?fetch=<bool>`: never fails, worst case the built-in list.
pub async fn list_models_for_caller(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Json<CallerModelList> {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let session = session_credential(&app_state, &headers).await;
    let credential = resolve_credential(&headers, session.as_ref());

    let (data, source) = app_state
        .model_cache
        .get_or_refresh(credential.as_ref(), force_refresh(&params))
        .await;

    // 有 key 却落到默认列表，说明上游不可用
    let error = (credential.is_some() && source == ModelSource::Default)
        .then(|| "Failed to fetch models from DeepSeek; serving defaults".to_string());

    Json(CallerModelList {
        data,
        source,
        error,
    })
}

/// `GET /v1/models`: Authorization header only, live fetch first.
pub async fn list_models_openai(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<OpenAIModelList> {
    let credential = header_credential(&headers);
    let data = app_state
        .model_cache
        .get_live_first(credential.as_ref())
        .await;

    Json(OpenAIModelList {
        object: "list",
        data,
    })
}
