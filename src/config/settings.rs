use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SESSION_SECRET: &str = "dev-secret-key-change-in-production";
pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.deepseek.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Key probe timeout.
    pub validate_timeout_secs: u64,
    pub models_timeout_secs: u64,
    /// Bounds connect + initial response only; streamed bodies are not limited.
    pub chat_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE.to_string(),
            validate_timeout_secs: 5,
            models_timeout_secs: 10,
            chat_timeout_secs: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn validate_timeout(&self) -> Duration {
        Duration::from_secs(self.validate_timeout_secs)
    }

    pub fn models_timeout(&self) -> Duration {
        Duration::from_secs(self.models_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    /// Force the `Secure` cookie attribute even without `X-Forwarded-Proto: https`.
    pub cookie_secure: bool,
    // Never read from or written to the config file; see `apply_overrides`.
    #[serde(skip, default = "default_secret")]
    pub secret: String,
}

fn default_secret() -> String {
    DEFAULT_SESSION_SECRET.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 12,
            cookie_secure: false,
            secret: default_secret(),
        }
    }
}

impl Settings {
    /// Loads the first config file found (or defaults) and applies environment overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = match Self::find_config_file() {
            Some(path) => Self::load_from(Path::new(path))?,
            None => {
                tracing::info!("No config file found, using built-in defaults");
                Settings::default()
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());

        if settings.session.secret == DEFAULT_SESSION_SECRET {
            tracing::warn!("SESSION_SECRET not set; using the insecure development default");
        }

        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config_content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&config_content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    }

    /// Environment overrides, with the lookup injected so callers need not mutate the process env.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("GATEWAY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("GATEWAY_PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid GATEWAY_PORT"),
            }
        }
        if let Some(base) = non_empty("DEEPSEEK_API_BASE") {
            self.upstream.base_url = base;
        }
        if let Some(secret) = non_empty("SESSION_SECRET") {
            self.session.secret = secret;
        }
    }

    fn find_config_file() -> Option<&'static str> {
        let possible_names = ["custom-config.toml", "config.toml"];
        possible_names
            .into_iter()
            .find(|name| Path::new(name).exists())
    }
}
