//! Analysis client configuration.
//!
//! Resolved once at process startup and passed into the transport. Nothing in the
//! request path reads the process environment.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

/// Primary environment variable holding the service credential.
pub const API_KEY_VAR: &str = "API_KEY";
/// Fallback credential variable.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "CLINRX_MODEL";
pub const BASE_URL_VAR: &str = "CLINRX_BASE_URL";
pub const TIMEOUT_VAR: &str = "CLINRX_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default timeout for a generation request (2 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the generation service client.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with default model, endpoint and timeouts.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Resolve from the process environment, loading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup.
    ///
    /// A missing credential is logged and tolerated; requests fail later with
    /// `TransportError::MissingCredential`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).or_else(|| non_empty(GEMINI_API_KEY_VAR));
        if api_key.is_none() {
            warn!(
                "{} environment variable not set; analysis requests will be rejected",
                API_KEY_VAR
            );
        }

        let mut config = Self::new(api_key);

        if let Some(model) = non_empty(MODEL_VAR) {
            config = config.with_model(model.trim());
        }
        if let Some(url) = non_empty(BASE_URL_VAR) {
            config = config.with_base_url(&url)?;
        }
        if let Some(raw) = non_empty(TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }

        info!(
            model = config.model.as_str(),
            base_url = config.base_url.as_str(),
            timeout_secs = config.timeout.as_secs(),
            "Analysis client configured"
        );
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the service endpoint. Must be http(s) without embedded credentials.
    pub fn with_base_url(mut self, base_url: &str) -> ConfigResult<Self> {
        let cleaned = base_url.trim().trim_end_matches('/');
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: cleaned.to_string(),
            reason,
        };

        let parsed = reqwest::Url::parse(cleaned).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "scheme must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("URL must not contain credentials".to_string()));
        }

        self.base_url = cleaned.to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
