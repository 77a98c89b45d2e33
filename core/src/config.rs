//! Client configuration.

use std::time::Duration;

use tracing::warn;

/// Origin used for relative endpoint references.
pub const DEFAULT_BASE_URL: &str = "https://api.restful-api.dev/";
/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// JPEG quality (1-100) used when re-encoding image parameters.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

pub const ENV_BASE_URL: &str = "RSAPI_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "RSAPI_TIMEOUT_SECS";

/// Settings fixed for the lifetime of an [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix joined verbatim in front of relative endpoints.
    pub base_url: String,
    pub timeout: Duration,
    pub jpeg_quality: u8,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `RSAPI_BASE_URL` and `RSAPI_TIMEOUT_SECS`.
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        config
    }

    /// Absolute endpoints pass through; anything else is appended to the
    /// base URL. Only the `http` prefix check ignores case.
    pub fn resolve(&self, endpoint: &str) -> String {
        resolve_endpoint(&self.base_url, endpoint)
    }
}

/// See [`ClientConfig::resolve`].
pub fn resolve_endpoint(base_url: &str, endpoint: &str) -> String {
    let is_absolute = endpoint
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"));
    if is_absolute {
        endpoint.to_string()
    } else {
        format!("{base_url}{endpoint}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    jpeg_quality: Option<u8>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Clamped to 1..=100.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality.clamp(1, 100));
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            jpeg_quality: self.jpeg_quality.unwrap_or(defaults.jpeg_quality),
            user_agent: self.user_agent,
        }
    }
}
