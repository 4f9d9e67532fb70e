use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use hex::encode as hex_encode;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tokio::sync::RwLock;

use crate::error::GatewayError;
use crate::server::credential::Credential;

pub const SESSION_COOKIE: &str = "dsg_session";
const SESSION_ID_LEN: usize = 48;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
struct SessionEntry {
    credential: Credential,
    expires_at: DateTime<Utc>,
}

/// In-memory sessions keyed by random ids. The cookie carries `<id>.<hmac>` so a
/// forged or guessed id is rejected before lookup; the key itself never leaves the server.
pub struct SessionStore {
    mac: HmacSha256,
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, GatewayError> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| GatewayError::Config(format!("invalid session secret: {}", e)))?;
        Ok(Self {
            mac,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    fn random_string(len: usize) -> String {
        let rng = rand::rng();
        use rand::distr::Alphanumeric;
        rng.sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn sign(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        hex_encode(mac.finalize().into_bytes())
    }

    fn verify(&self, token: &str) -> Option<String> {
        let (id, sig) = token.split_once('.')?;
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(id.to_string())
    }

    /// Stores the credential and returns the signed cookie value.
    pub async fn create(&self, credential: Credential) -> String {
        self.create_at(credential, Utc::now()).await
    }

    async fn create_at(&self, credential: Credential, now: DateTime<Utc>) -> String {
        let id = Self::random_string(SESSION_ID_LEN);
        let entry = SessionEntry {
            credential,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, e| e.expires_at > now);
        sessions.insert(id.clone(), entry);

        format!("{}.{}", id, self.sign(&id))
    }

    pub async fn resolve(&self, token: &str) -> Option<Credential> {
        self.resolve_at(token, Utc::now()).await
    }

    async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<Credential> {
        let id = self.verify(token)?;
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id)?;
        (entry.expires_at > now).then(|| entry.credential.clone())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn cookie_header(&self, token: &str, secure: bool) -> String {
        let mut v = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        );
        if secure {
            v.push_str("; Secure");
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new("test-secret", Duration::hours(1)).unwrap()
    }

    #[tokio::test]
    async fn round_trips_credential() {
        let s = store();
        let cred = Credential::new("sk-session-key").unwrap();
        let token = s.create(cred.clone()).await;
        assert!(!token.contains("sk-session-key"));
        assert_eq!(s.resolve(&token).await, Some(cred));
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let s = store();
        let token = s.create(Credential::new("sk-a").unwrap()).await;
        let (id, sig) = token.split_once('.').unwrap();

        let mut bad_sig = sig.to_string();
        bad_sig.replace_range(0..1, if sig.starts_with('0') { "1" } else { "0" });
        assert_eq!(s.resolve(&format!("{}.{}", id, bad_sig)).await, None);
        assert_eq!(s.resolve(id).await, None);
        assert_eq!(s.resolve("garbage").await, None);

        let other = SessionStore::new("other-secret", Duration::hours(1)).unwrap();
        assert_eq!(other.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn expired_sessions_resolve_to_none_and_are_pruned() {
        let s = store();
        let t0 = Utc::now();
        let token = s.create_at(Credential::new("sk-a").unwrap(), t0).await;

        assert!(s.resolve_at(&token, t0 + Duration::minutes(59)).await.is_some());
        assert!(s.resolve_at(&token, t0 + Duration::hours(1)).await.is_none());

        s.create_at(Credential::new("sk-b").unwrap(), t0 + Duration::hours(2))
            .await;
        assert_eq!(s.len().await, 1);
    }

    #[test]
    fn cookie_attributes() {
        let s = store();
        let c = s.cookie_header("abc.def", true);
        assert!(c.starts_with("dsg_session=abc.def; Path=/; HttpOnly"));
        assert!(c.contains("Max-Age=3600"));
        assert!(c.ends_with("; Secure"));
        assert!(!s.cookie_header("abc.def", false).contains("Secure"));
    }
}
