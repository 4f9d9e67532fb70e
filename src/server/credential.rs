use std::fmt;

use axum::http::HeaderMap;

use crate::server::util::{bearer_token, mask_key};

/// Opaque upstream API key. Only equality is meaningful; `Debug`/`Display` are masked.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` for empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_key(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// `Authorization: Bearer` header only.
pub fn header_credential(headers: &HeaderMap) -> Option<Credential> {
    bearer_token(headers).and_then(Credential::new)
}

/// Header first, then the session credential established by key validation.
pub fn resolve_credential(headers: &HeaderMap, session: Option<&Credential>) -> Option<Credential> {
    header_credential(headers).or_else(|| session.cloned())
}
