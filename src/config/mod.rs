//! Configuration types for the MNS client.
//!
//! `MnsConfig` is the endpoint configuration shared read-only by every call
//! made through a client: credentials, endpoint, the optional per-attempt
//! timeout, the base64 transport flag and the retry settings.

use crate::credentials::MnsCredentials;
use crate::error::{ConfigurationError, MnsError};
use crate::pool::DEFAULT_BUFFER_CAPACITY;
use crate::resilience::RetryConfig;
use std::time::Duration;
use url::Url;

/// Environment variable holding the account endpoint.
pub const ENV_ENDPOINT: &str = "MNS_ENDPOINT";
/// Environment variable holding the per-attempt timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "MNS_TIMEOUT_MS";
/// Environment variable enabling base64 transport encoding.
pub const ENV_BASE64_ENABLED: &str = "MNS_BASE64_ENABLED";
/// Environment variable holding the retry attempt cap.
pub const ENV_MAX_ATTEMPTS: &str = "MNS_MAX_ATTEMPTS";

/// Configuration for the MNS client.
#[derive(Debug)]
pub struct MnsConfig {
    /// Access key pair.
    pub credentials: MnsCredentials,

    /// Account endpoint, e.g. `https://$AccountId.mns.cn-hangzhou.aliyuncs.com`.
    pub endpoint: Url,

    /// Per-attempt timeout. `None` leaves attempts unbounded unless the call
    /// context carries a deadline.
    pub timeout: Option<Duration>,

    /// Base64-encode message bodies on send and decode them on receive.
    pub base64_enabled: bool,

    /// Retry settings.
    pub retry: RetryConfig,

    /// Connection timeout of the default transport.
    pub connect_timeout: Duration,

    /// Maximum idle connections per host kept by the default transport.
    pub max_idle_connections: usize,

    /// Idle connection timeout of the default transport.
    pub idle_timeout: Option<Duration>,

    /// Initial capacity of pooled buffers created for this client.
    pub buffer_capacity: usize,
}

impl MnsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> MnsConfigBuilder {
        MnsConfigBuilder::new()
    }

    /// Base URL of a queue or topic: `<endpoint>/<collection>/<name>`.
    pub fn resource_url(&self, collection: &str, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            collection,
            name
        )
    }
}

/// Builder for `MnsConfig`.
#[derive(Default)]
pub struct MnsConfigBuilder {
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    credentials: Option<MnsCredentials>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    base64_enabled: Option<bool>,
    retry: Option<RetryConfig>,
    max_attempts: Option<u32>,
    connect_timeout: Option<Duration>,
    max_idle_connections: Option<usize>,
    idle_timeout: Option<Option<Duration>>,
    buffer_capacity: Option<usize>,
}

impl MnsConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access key id.
    pub fn access_key_id(mut self, id: impl Into<String>) -> Self {
        self.access_key_id = Some(id.into());
        self
    }

    /// Set the access key secret.
    pub fn access_key_secret(mut self, secret: impl Into<String>) -> Self {
        self.access_key_secret = Some(secret.into());
        self
    }

    /// Set both parts of the access key at once.
    pub fn credentials(mut self, credentials: MnsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the account endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-attempt timeout. A zero duration disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable base64 transport encoding of message bodies.
    pub fn base64_enabled(mut self, enabled: bool) -> Self {
        self.base64_enabled = Some(enabled);
        self
    }

    /// Set the retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the attempt cap, keeping the configured fault classifier.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the connection timeout of the default transport.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host of the default transport.
    pub fn max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = Some(max);
        self
    }

    /// Set the idle connection timeout of the default transport.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the initial capacity of pooled buffers.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `MNS_ACCESS_KEY_ID`, `MNS_ACCESS_KEY_SECRET`, `MNS_ENDPOINT`,
    /// `MNS_TIMEOUT_MS`, `MNS_BASE64_ENABLED` and `MNS_MAX_ATTEMPTS`. Values
    /// that fail to parse are ignored. Credentials are taken only when both
    /// key variables are set and non-empty.
    pub fn from_env(mut self) -> Self {
        if let Ok(credentials) = MnsCredentials::from_env() {
            self.access_key_id = None;
            self.access_key_secret = None;
            self.credentials = Some(credentials);
        }
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
        if let Ok(val) = std::env::var(ENV_TIMEOUT_MS) {
            if let Ok(ms) = val.parse() {
                self.timeout = Some(Duration::from_millis(ms));
            }
        }
        if let Ok(val) = std::env::var(ENV_BASE64_ENABLED) {
            let val = val.to_lowercase();
            self.base64_enabled = Some(val == "true" || val == "1");
        }
        if let Ok(val) = std::env::var(ENV_MAX_ATTEMPTS) {
            if let Ok(attempts) = val.parse() {
                self.max_attempts = Some(attempts);
            }
        }

        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<MnsConfig, MnsError> {
        let credentials = match (self.credentials, self.access_key_id, self.access_key_secret) {
            (_, Some(id), Some(secret)) => MnsCredentials::new(id, secret),
            (Some(credentials), _, _) => credentials,
            _ => return Err(ConfigurationError::MissingCredentials.into()),
        };
        if !credentials.is_complete() {
            return Err(ConfigurationError::MissingCredentials.into());
        }

        let raw_endpoint = self.endpoint.ok_or(ConfigurationError::MissingEndpoint)?;
        let endpoint = parse_endpoint(&raw_endpoint)?;

        let mut retry = self.retry.unwrap_or_default();
        if let Some(attempts) = self.max_attempts {
            retry.max_attempts = attempts;
        }
        if retry.max_attempts == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            }
            .into());
        }

        let buffer_capacity = self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);
        if buffer_capacity == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "buffer_capacity".to_string(),
                message: "buffer capacity must be positive".to_string(),
            }
            .into());
        }

        Ok(MnsConfig {
            credentials,
            endpoint,
            timeout: self.timeout.filter(|t| !t.is_zero()),
            base64_enabled: self.base64_enabled.unwrap_or(false),
            retry,
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(5)),
            max_idle_connections: self.max_idle_connections.unwrap_or(100),
            idle_timeout: self
                .idle_timeout
                .unwrap_or(Some(Duration::from_secs(90))),
            buffer_capacity,
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, MnsError> {
    let invalid = |details: String| -> MnsError {
        ConfigurationError::InvalidEndpoint {
            url: raw.to_string(),
            details,
        }
        .into()
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("endpoint must not carry a query or fragment".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET};

    const ENDPOINT: &str = "https://123456.mns.cn-hangzhou.aliyuncs.com";

    fn builder() -> MnsConfigBuilder {
        MnsConfig::builder()
            .access_key_id("LTAIexample")
            .access_key_secret("secret")
            .endpoint(ENDPOINT)
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.timeout, None);
        assert!(!config.base64_enabled);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.buffer_capacity, 16 * 1024);
        assert_eq!(config.credentials.access_key_id(), "LTAIexample");
    }

    #[test]
    fn test_builder() {
        let config = builder()
            .timeout(Duration::from_secs(5))
            .base64_enabled(true)
            .max_attempts(5)
            .build()
            .unwrap();

        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(config.base64_enabled);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = builder().timeout(Duration::ZERO).build().unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_missing_credentials() {
        let err = MnsConfig::builder().endpoint(ENDPOINT).build().unwrap_err();
        assert!(matches!(
            err,
            MnsError::Configuration(ConfigurationError::MissingCredentials)
        ));

        let err = MnsConfig::builder()
            .access_key_id("id")
            .access_key_secret("")
            .endpoint(ENDPOINT)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            MnsError::Configuration(ConfigurationError::MissingCredentials)
        ));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = MnsConfig::builder()
            .credentials(MnsCredentials::new("id", "secret"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            MnsError::Configuration(ConfigurationError::MissingEndpoint)
        ));

        for endpoint in ["not a url", "ftp://example.com", "https://example.com/?a=b"] {
            let err = builder().endpoint(endpoint).build().unwrap_err();
            assert!(
                matches!(
                    err,
                    MnsError::Configuration(ConfigurationError::InvalidEndpoint { .. })
                ),
                "endpoint {} should be rejected",
                endpoint
            );
        }
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(
            err,
            MnsError::Configuration(ConfigurationError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_resource_url() {
        let config = builder().endpoint(format!("{}/", ENDPOINT)).build().unwrap();
        assert_eq!(
            config.resource_url("queues", "orders"),
            "https://123456.mns.cn-hangzhou.aliyuncs.com/queues/orders"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = MnsConfig::builder()
            .access_key_id("LTAIexample")
            .access_key_secret("super-secret-value")
            .endpoint(ENDPOINT)
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("LTAIexample"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_ACCESS_KEY_ID, "env-id");
        std::env::set_var(ENV_ACCESS_KEY_SECRET, "env-secret");
        std::env::set_var(ENV_ENDPOINT, ENDPOINT);
        std::env::set_var(ENV_TIMEOUT_MS, "2500");
        std::env::set_var(ENV_BASE64_ENABLED, "true");
        std::env::set_var(ENV_MAX_ATTEMPTS, "2");

        let config = MnsConfig::builder().from_env().build().unwrap();
        let overridden = MnsConfig::builder()
            .access_key_id("explicit-id")
            .access_key_secret("explicit-secret")
            .from_env()
            .build()
            .unwrap();

        std::env::remove_var(ENV_ACCESS_KEY_SECRET);
        let partial = MnsConfig::builder()
            .access_key_id("explicit-id")
            .access_key_secret("explicit-secret")
            .from_env()
            .build()
            .unwrap();

        for var in [
            ENV_ACCESS_KEY_ID,
            ENV_ACCESS_KEY_SECRET,
            ENV_ENDPOINT,
            ENV_TIMEOUT_MS,
            ENV_BASE64_ENABLED,
            ENV_MAX_ATTEMPTS,
        ] {
            std::env::remove_var(var);
        }

        assert_eq!(config.credentials.access_key_id(), "env-id");
        assert_eq!(config.credentials.access_key_secret(), "env-secret");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert!(config.base64_enabled);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(overridden.credentials.access_key_id(), "env-id");
        assert_eq!(partial.credentials.access_key_id(), "explicit-id");
    }
}
