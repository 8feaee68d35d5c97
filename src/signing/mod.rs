//! MNS request signing.
//!
//! Requests are authenticated with an HMAC-SHA1 signature over a string built
//! from the method, the `Content-MD5`, `Content-Type` and `Date` headers, the
//! canonicalized `x-mns-*` headers and the request path and query:
//!
//! ```text
//! Signature = base64(hmac-sha1(HTTP_METHOD + "\n"
//!           + CONTENT-MD5 + "\n"
//!           + CONTENT-TYPE + "\n"
//!           + DATE + "\n"
//!           + CanonicalizedMNSHeaders
//!           + CanonicalizedResource))
//! ```

mod canonical;
mod signer;

pub use canonical::{build_string_to_sign, canonicalized_mns_headers, canonicalized_resource};
pub use signer::{MnsSigner, RequestSigner};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method};
use ring::hmac;

/// Scheme used in the `Authorization` header.
pub const AUTHORIZATION_SCHEME: &str = "MNS";

/// Prefix of headers included in the canonicalized header block.
pub const MNS_HEADER_PREFIX: &str = "x-mns-";

/// Header carrying the API version.
pub const MNS_VERSION_HEADER: &str = "x-mns-version";

/// API version sent with every request.
pub const MNS_VERSION: &str = "2015-06-06";

/// Content type of MNS request documents.
pub const CONTENT_TYPE_XML: &str = "text/xml;charset=utf-8";

/// `Date` header layout, e.g. `Tue, 01 May 2018 15:04:05 GMT`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Calculate HMAC-SHA1 and return the base64 digest.
pub fn hmac_sha1_base64(key: &[u8], data: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    STANDARD.encode(hmac::sign(&key, data).as_ref())
}

/// Compute the request signature.
///
/// `headers` must already hold their final values; the canonicalized header
/// block is taken from them.
pub fn sign(
    method: &Method,
    headers: &HeaderMap,
    canonicalized_resource: &str,
    access_key_secret: &str,
) -> String {
    let string_to_sign = build_string_to_sign(method, headers, canonicalized_resource);
    hmac_sha1_base64(access_key_secret.as_bytes(), string_to_sign.as_bytes())
}

/// Build the `Authorization` header value.
pub fn authorization(access_key_id: &str, signature: &str) -> String {
    format!("{} {}:{}", AUTHORIZATION_SCHEME, access_key_id, signature)
}

/// Format a timestamp for the `Date` header.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_authorization() {
        assert_eq!(
            authorization("accessKeyId", "signature"),
            "MNS accessKeyId:signature"
        );
    }

    #[test]
    fn test_format_date() {
        let dt = Utc.with_ymd_and_hms(2018, 5, 1, 15, 4, 5).unwrap();
        assert_eq!(format_date(&dt), "Tue, 01 May 2018 15:04:05 GMT");
    }

    #[test]
    fn test_hmac_sha1_base64() {
        // RFC 2202 test case 2
        assert_eq!(
            hmac_sha1_base64(b"Jefe", b"what do ya want for nothing?"),
            "7/zfauXrL6LSdBbV8YTfnCWafHk="
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let first = headers(&[
            ("x-mns-version", "2015-06-06"),
            ("date", "Tue, 01 May 2018 15:04:05 GMT"),
            ("content-type", CONTENT_TYPE_XML),
            ("x-mns-custom", "a"),
        ]);
        let second = headers(&[
            ("x-mns-custom", "a"),
            ("content-type", CONTENT_TYPE_XML),
            ("date", "Tue, 01 May 2018 15:04:05 GMT"),
            ("x-mns-version", "2015-06-06"),
        ]);

        let a = sign(&Method::GET, &first, "/queues/q/messages", "secret");
        let b = sign(&Method::GET, &second, "/queues/q/messages", "secret");
        assert_eq!(a, b);
        assert_eq!(a, sign(&Method::GET, &first, "/queues/q/messages", "secret"));
    }

    #[test]
    fn test_sign_ignores_unrelated_headers() {
        let base = headers(&[
            ("date", "Tue, 01 May 2018 15:04:05 GMT"),
            ("x-mns-version", "2015-06-06"),
        ]);
        let mut extended = base.clone();
        extended.insert("user-agent", HeaderValue::from_static("test-agent"));
        extended.insert("accept", HeaderValue::from_static("*/*"));

        assert_eq!(
            sign(&Method::POST, &base, "/topics/t/messages", "secret"),
            sign(&Method::POST, &extended, "/topics/t/messages", "secret")
        );
    }

    #[test]
    fn test_sign_depends_on_secret_and_resource() {
        let map = headers(&[("date", "Tue, 01 May 2018 15:04:05 GMT")]);
        let base = sign(&Method::GET, &map, "/queues/q", "secret");
        assert_ne!(base, sign(&Method::GET, &map, "/queues/q", "other"));
        assert_ne!(base, sign(&Method::GET, &map, "/queues/r", "secret"));
        assert_ne!(base, sign(&Method::DELETE, &map, "/queues/q", "secret"));
    }
}
