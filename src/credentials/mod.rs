//! MNS access key credentials.

use crate::error::{ConfigurationError, MnsError};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Environment variable holding the access key id.
pub const ENV_ACCESS_KEY_ID: &str = "MNS_ACCESS_KEY_ID";

/// Environment variable holding the access key secret.
pub const ENV_ACCESS_KEY_SECRET: &str = "MNS_ACCESS_KEY_SECRET";

/// Access key pair used to sign requests.
#[derive(Clone)]
pub struct MnsCredentials {
    access_key_id: String,
    access_key_secret: SecretString,
}

impl MnsCredentials {
    /// Create new credentials.
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: SecretString::new(access_key_secret.into()),
        }
    }

    /// Load credentials from `MNS_ACCESS_KEY_ID` and `MNS_ACCESS_KEY_SECRET`.
    pub fn from_env() -> Result<Self, MnsError> {
        let id = std::env::var(ENV_ACCESS_KEY_ID).ok().filter(|v| !v.is_empty());
        let secret = std::env::var(ENV_ACCESS_KEY_SECRET)
            .ok()
            .filter(|v| !v.is_empty());

        match (id, secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(ConfigurationError::MissingCredentials.into()),
        }
    }

    /// Get the access key id.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the access key secret.
    ///
    /// Note: This exposes the secret. Use carefully and avoid logging.
    pub fn access_key_secret(&self) -> &str {
        self.access_key_secret.expose_secret()
    }

    /// Returns true if both parts are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.expose_secret().is_empty()
    }
}

impl fmt::Debug for MnsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"[REDACTED]")
            .finish()
    }
}
