use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::GatewayError;
use crate::providers::deepseek::client::truncate_for_log;
use crate::providers::deepseek::types::default_models;
use crate::providers::deepseek::{DeepSeekClient, Model};
use crate::server::credential::Credential;

/// Where a model listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelSource {
    #[serde(rename = "deepseek_api")]
    Api,
    #[serde(rename = "cache")]
    Cache,
    #[serde(rename = "default")]
    Default,
}

// entries 与 fetched_at 作为一个整体替换，读者看不到新旧混合的状态
#[derive(Debug, Clone, Default)]
struct Snapshot {
    entries: Arc<Vec<Model>>,
    fetched_at: Option<Instant>,
}

impl Snapshot {
    fn is_valid_at(&self, now: Instant, ttl: Duration) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) < ttl,
            None => false,
        }
    }
}

/// Upstream model catalog with a TTL, shared by every caller and key.
///
/// The catalog is not partitioned per credential: a refresh with one key
/// changes what every other caller sees until the next refresh.
pub struct ModelCache {
    client: DeepSeekClient,
    fetch_timeout: Duration,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
}

impl ModelCache {
    pub fn new(client: DeepSeekClient, fetch_timeout: Duration, ttl: Duration) -> Self {
        Self {
            client,
            fetch_timeout,
            ttl,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub async fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now()).await
    }

    pub async fn is_valid_at(&self, now: Instant) -> bool {
        self.snapshot.read().await.is_valid_at(now, self.ttl)
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.entries.len()
    }

    /// Cached entries, only while the cache is valid.
    pub async fn cached(&self) -> Option<Vec<Model>> {
        let snapshot = self.snapshot.read().await;
        if snapshot.is_valid_at(Instant::now(), self.ttl) {
            Some(snapshot.entries.as_ref().clone())
        } else {
            None
        }
    }

    /// Caller-facing listing: forced fetch, then valid cache, then fetch, then defaults.
    pub async fn get_or_refresh(
        &self,
        credential: Option<&Credential>,
        force_refresh: bool,
    ) -> (Vec<Model>, ModelSource) {
        let Some(credential) = credential else {
            return (default_models(), ModelSource::Default);
        };

        if force_refresh && let Some(models) = self.fetch(credential).await {
            return (models, ModelSource::Api);
        }

        if let Some(models) = self.cached().await {
            return (models, ModelSource::Cache);
        }

        if let Some(models) = self.fetch(credential).await {
            return (models, ModelSource::Api);
        }

        (default_models(), ModelSource::Default)
    }

    /// OpenAI-surface listing: live fetch whenever a key is given, then valid cache, then defaults.
    pub async fn get_live_first(&self, credential: Option<&Credential>) -> Vec<Model> {
        if let Some(credential) = credential
            && let Some(models) = self.fetch(credential).await
        {
            return models;
        }

        if let Some(models) = self.cached().await {
            return models;
        }

        default_models()
    }

    /// Fetches and rewrites the upstream catalog, replacing the cache on success.
    /// Failures are logged and reported as `None`.
    /// An empty catalog counts as no data: the cache is left as it was.
    pub async fn fetch(&self, credential: &Credential) -> Option<Vec<Model>> {
        let response = match self
            .client
            .list_models(credential.expose(), self.fetch_timeout)
            .await
        {
            Ok(r) => r,
            Err(GatewayError::UpstreamStatus { status, body }) => {
                tracing::error!(
                    key = %credential,
                    status,
                    body = %truncate_for_log(&body),
                    "Failed to fetch models from DeepSeek"
                );
                return None;
            }
            Err(e) => {
                tracing::error!(key = %credential, error = %e, "Error fetching models from DeepSeek");
                return None;
            }
        };

        let models: Vec<Model> = response
            .data
            .into_iter()
            .map(Model::with_provider_prefix)
            .collect();

        if models.is_empty() {
            tracing::warn!("DeepSeek returned an empty model catalog; keeping previous cache");
            return None;
        }

        self.replace(models.clone(), Instant::now()).await;
        tracing::info!(count = models.len(), "Successfully fetched models from DeepSeek");
        Some(models)
    }

    async fn replace(&self, models: Vec<Model>, fetched_at: Instant) {
        let next = Snapshot {
            entries: Arc::new(models),
            fetched_at: Some(fetched_at),
        };
        *self.snapshot.write().await = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TTL: Duration = Duration::from_secs(300);

    fn catalog() -> serde_json::Value {
        json!({
            "object": "list",
            "data": [
                {"id": "deepseek-chat", "object": "model", "owned_by": "deepseek"},
                {"id": "deepseek-reasoner", "object": "model", "created": 1700000000, "owned_by": "deepseek"}
            ]
        })
    }

    async fn mount_catalog(server: &MockServer, key: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("Authorization", format!("Bearer {}", key).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog()))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn cache_for(server: &MockServer) -> ModelCache {
        let client = DeepSeekClient::new(&server.uri()).unwrap();
        ModelCache::new(client, Duration::from_secs(2), TTL)
    }

    fn key(k: &str) -> Credential {
        Credential::new(k).unwrap()
    }

    #[test]
    fn ttl_boundary_is_exclusive() {
        let t0 = Instant::now();
        let snapshot = Snapshot {
            entries: Arc::new(default_models()),
            fetched_at: Some(t0),
        };
        assert!(snapshot.is_valid_at(t0, TTL));
        assert!(snapshot.is_valid_at(t0 + TTL - Duration::from_millis(1), TTL));
        assert!(!snapshot.is_valid_at(t0 + TTL, TTL));
        assert!(!snapshot.is_valid_at(t0 + TTL + Duration::from_secs(1), TTL));
        assert!(!Snapshot::default().is_valid_at(t0, TTL));
    }

    #[tokio::test]
    async fn no_credential_always_yields_defaults() {
        let server = MockServer::start().await;
        mount_catalog(&server, "sk-a", 1).await;
        let cache = cache_for(&server);

        assert!(cache.fetch(&key("sk-a")).await.is_some());
        assert!(cache.is_valid().await);

        let (models, source) = cache.get_or_refresh(None, true).await;
        assert_eq!(source, ModelSource::Default);
        assert_eq!(models, default_models());
    }

    #[tokio::test]
    async fn fetch_prefixes_ids_and_preserves_fields() {
        let server = MockServer::start().await;
        mount_catalog(&server, "sk-a", 1).await;
        let cache = cache_for(&server);

        let (models, source) = cache.get_or_refresh(Some(&key("sk-a")), false).await;
        assert_eq!(source, ModelSource::Api);
        let out = serde_json::to_value(&models).unwrap();
        assert_eq!(
            out,
            json!([
                {"id": "deepseek/deepseek-chat", "object": "model", "owned_by": "deepseek"},
                {"id": "deepseek/deepseek-reasoner", "object": "model", "created": 1700000000, "owned_by": "deepseek"}
            ])
        );
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn valid_cache_short_circuits_unless_forced() {
        let server = MockServer::start().await;
        mount_catalog(&server, "sk-a", 2).await;
        let cache = cache_for(&server);
        let k = key("sk-a");

        assert_eq!(cache.get_or_refresh(Some(&k), false).await.1, ModelSource::Api);
        assert_eq!(cache.get_or_refresh(Some(&k), false).await.1, ModelSource::Cache);
        assert_eq!(cache.get_or_refresh(Some(&k), true).await.1, ModelSource::Api);
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;
        let cache = cache_for(&server);

        let (models, source) = cache.get_or_refresh(Some(&key("sk-a")), true).await;
        assert_eq!(source, ModelSource::Default);
        assert_eq!(models, default_models());
        assert!(!cache.is_valid().await);
    }

    #[tokio::test]
    async fn empty_catalog_does_not_replace_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": []})))
            .mount(&server)
            .await;
        let cache = cache_for(&server);

        assert!(cache.fetch(&key("sk-a")).await.is_none());
        assert_eq!(cache.len().await, 0);
        assert!(!cache.is_valid().await);
    }

    #[tokio::test]
    async fn cache_is_shared_across_keys() {
        let server = MockServer::start().await;
        mount_catalog(&server, "sk-a", 1).await;
        let cache = cache_for(&server);

        cache.fetch(&key("sk-a")).await.unwrap();
        // 另一个 key 在有效期内直接命中同一份缓存，不会触发上游请求
        let (models, source) = cache.get_or_refresh(Some(&key("sk-b")), false).await;
        assert_eq!(source, ModelSource::Cache);
        assert_eq!(models.len(), 2);
    }

    #[tokio::test]
    async fn live_first_prefers_fetch_then_cache_then_defaults() {
        let server = MockServer::start().await;
        mount_catalog(&server, "sk-a", 2).await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("Authorization", "Bearer sk-bad"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let cache = cache_for(&server);

        assert_eq!(cache.get_live_first(None).await, default_models());

        let live = cache.get_live_first(Some(&key("sk-a"))).await;
        assert_eq!(live[0].id, "deepseek/deepseek-chat");
        // 缓存有效也仍然走上游
        let again = cache.get_live_first(Some(&key("sk-a"))).await;
        assert_eq!(again, live);

        assert_eq!(cache.get_live_first(Some(&key("sk-bad"))).await, live);
        assert_eq!(cache.get_live_first(None).await, live);
    }

    #[tokio::test]
    async fn concurrent_refreshes_leave_a_whole_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog()))
            .mount(&server)
            .await;
        let cache = Arc::new(cache_for(&server));

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.fetch(&key(&format!("sk-{}", i))).await
            }));
        }
        for h in handles {
            assert!(h.await.unwrap().is_some());
        }
        assert_eq!(cache.len().await, 2);
        assert!(cache.is_valid().await);
    }
}
