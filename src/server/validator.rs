use std::time::Duration;

use crate::error::GatewayError;
use crate::providers::deepseek::DeepSeekClient;
use crate::providers::deepseek::client::truncate_for_log;
use crate::server::credential::Credential;

/// Checks a key by listing models upstream; there is no introspection endpoint.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    client: DeepSeekClient,
    timeout: Duration,
}

impl CredentialValidator {
    pub fn new(client: DeepSeekClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Never errors: rejection and network failure both read as `false`. Not cached.
    pub async fn validate(&self, credential: &Credential) -> bool {
        match self.client.list_models(credential.expose(), self.timeout).await {
            Ok(_) => true,
            Err(GatewayError::UpstreamStatus { status, body }) => {
                tracing::warn!(
                    key = %credential,
                    status,
                    body = %truncate_for_log(&body),
                    "API key rejected by upstream"
                );
                false
            }
            Err(e) => {
                tracing::warn!(key = %credential, error = %e, "API key validation probe failed");
                false
            }
        }
    }
}
