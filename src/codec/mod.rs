//! Message body transport encoding and integrity digests.
//!
//! MNS reports the MD5 of every message body it stores or returns as
//! uppercase hex (`MessageBodyMD5`). The `Content-MD5` request header uses the
//! base64 form of the same digest instead.

use crate::error::{IntegrityError, MnsError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};

/// Base64-encode a message body for transport.
pub fn encode(body: &[u8]) -> Vec<u8> {
    encode_to_string(body).into_bytes()
}

/// Base64-encode a message body as text.
pub fn encode_to_string(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Decode a base64 message body.
///
/// Line breaks inside the encoded text are ignored.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, MnsError> {
    let compact: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| *b != b'\r' && *b != b'\n')
        .collect();

    STANDARD.decode(&compact).map_err(|e| {
        MnsError::Integrity(IntegrityError::Encoding {
            message: format!(
                "base64 decode failed, src={}, error={}",
                String::from_utf8_lossy(data),
                e
            ),
        })
    })
}

/// MD5 of a message body as uppercase hex, the form used by `MessageBodyMD5`.
pub fn message_body_md5(body: &[u8]) -> String {
    hex::encode_upper(Md5::digest(body))
}

/// MD5 of a request body as base64, the form used by the `Content-MD5` header.
pub fn content_md5(body: &[u8]) -> String {
    STANDARD.encode(Md5::digest(body))
}

/// Check the digest reported by the service against the body.
///
/// The reported value is compared case-insensitively.
pub fn verify_message_body_md5(body: &[u8], reported: &str) -> Result<(), MnsError> {
    let expected = message_body_md5(body);
    if reported.to_ascii_uppercase() == expected {
        return Ok(());
    }
    Err(MnsError::Integrity(IntegrityError::Mismatch {
        message_body: body.to_vec(),
        expected,
        observed: reported.to_string(),
    }))
}
