//! Request signer implementation.

use super::{authorization, sign};
use crate::credentials::MnsCredentials;
use http::{HeaderMap, Method};
use std::fmt;

/// Produces the `Authorization` header value for a request.
///
/// Implementations must be callable from many tasks at once; the executor
/// signs every attempt again.
pub trait RequestSigner: Send + Sync {
    /// Sign a request whose headers already hold their final values.
    fn authorization(&self, method: &Method, headers: &HeaderMap, resource: &str) -> String;
}

/// HMAC-SHA1 signer backed by an access key pair.
#[derive(Clone)]
pub struct MnsSigner {
    credentials: MnsCredentials,
}

impl MnsSigner {
    /// Create a new signer.
    pub fn new(credentials: MnsCredentials) -> Self {
        Self { credentials }
    }

    /// Get the access key id used in the `Authorization` header.
    pub fn access_key_id(&self) -> &str {
        self.credentials.access_key_id()
    }
}

impl RequestSigner for MnsSigner {
    fn authorization(&self, method: &Method, headers: &HeaderMap, resource: &str) -> String {
        let signature = sign(
            method,
            headers,
            resource,
            self.credentials.access_key_secret(),
        );
        authorization(self.credentials.access_key_id(), &signature)
    }
}

impl fmt::Debug for MnsSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnsSigner")
            .field("access_key_id", &self.credentials.access_key_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_authorization_header_shape() {
        let signer = MnsSigner::new(MnsCredentials::new("testid", "testsecret"));
        let mut headers = HeaderMap::new();
        headers.insert("date", HeaderValue::from_static("Tue, 01 May 2018 15:04:05 GMT"));
        headers.insert("x-mns-version", HeaderValue::from_static("2015-06-06"));

        let value = signer.authorization(&Method::GET, &headers, "/queues/q/messages");
        let expected = format!(
            "MNS testid:{}",
            sign(&Method::GET, &headers, "/queues/q/messages", "testsecret")
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = MnsSigner::new(MnsCredentials::new("testid", "testsecret"));
        let debug = format!("{:?}", signer);
        assert!(debug.contains("testid"));
        assert!(!debug.contains("testsecret"));
    }
}
