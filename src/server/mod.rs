pub mod handlers;
pub(crate) mod credential;
pub(crate) mod model_cache;
pub(crate) mod passthrough;
pub(crate) mod session;
pub(crate) mod util;
pub(crate) mod validator;

use crate::config::Settings;
use crate::error::Result as AppResult;
use crate::providers::{DeepSeekTranslator, RequestTranslator};
use crate::providers::deepseek::DeepSeekClient;
use crate::server::model_cache::ModelCache;
use crate::server::session::SessionStore;
use crate::server::validator::CredentialValidator;
use axum::Router;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub client: DeepSeekClient,
    pub validator: CredentialValidator,
    pub model_cache: Arc<ModelCache>,
    pub translator: Arc<dyn RequestTranslator>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Settings) -> AppResult<Self> {
        let client = DeepSeekClient::new(&config.upstream.base_url)?;
        let validator = CredentialValidator::new(client.clone(), config.upstream.validate_timeout());
        let model_cache = Arc::new(ModelCache::new(
            client.clone(),
            config.upstream.models_timeout(),
            config.cache.ttl(),
        ));
        let sessions = Arc::new(SessionStore::new(
            &config.session.secret,
            chrono::Duration::hours(config.session.ttl_hours),
        )?);

        Ok(Self {
            config,
            client,
            validator,
            model_cache,
            translator: Arc::new(DeepSeekTranslator),
            sessions,
        })
    }
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    tracing::info!(upstream = %config.upstream.base_url, "Proxying to upstream");
    let app_state = AppState::new(config)?;
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    let mut app = handlers::routes().with_state(Arc::new(app_state));

    // CORS：反射请求来源，允许携带会话 Cookie
    use axum::http::{Method, header};
    use tower_http::cors::{AllowOrigin, CorsLayer};
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);
    app = app
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    app
}
