use std::fmt;
use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional file, then apply `GRIDIRON_*`
    /// environment overrides (e.g. `GRIDIRON_SERVER__PORT=4001`).
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("GRIDIRON").separator("__"));
        builder.build()?.try_deserialize()
    }

    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// "development", "staging" or "production"; controls the cookie
    /// `Secure` attribute and the healthcheck payload.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// HMAC key for the session cookie. Empty means a random key is
    /// generated at startup (sessions then do not survive restarts).
    pub secret: String,
    pub max_age_seconds: u64,
    /// "memory" or "redis"
    pub backend: String,
    pub redis_url: String,
    pub redis_key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-session".to_string(),
            secret: String::new(),
            max_age_seconds: 86_400,
            backend: "memory".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            redis_key_prefix: "gridiron:session:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL the provider redirects back to; the per-provider callback
    /// path is derived from it as `{base}/v1/auth/{name}/callback`.
    pub base_callback_url: String,
    /// Upper bound for discovery, code-exchange and key-fetch round trips.
    pub http_timeout_seconds: u64,
    pub providers: Vec<ProviderSettings>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_callback_url: "http://localhost:4000".to_string(),
            http_timeout_seconds: 10,
            providers: Vec::new(),
        }
    }
}

/// Static settings for one identity provider, as read from configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
    /// Extra scopes on top of the mandatory `openid profile email`.
    pub scopes: Vec<String>,
}

// Manual Debug: the client secret must never reach logs.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
