//! Error types for the MNS integration.
//!
//! Errors are grouped by the stage of the request pipeline that produced them:
//! configuration, request construction, message integrity, transport, and
//! service-reported failures. Service failures keep the HTTP status, the MNS
//! error code and the request id so callers can branch on them programmatically.

mod mapping;

pub use mapping::{
    classify, decode_error_response, is_message_not_exist, is_queue_not_exist,
    is_receipt_handle_error, is_topic_not_exist, ErrorCategory, CODE_MESSAGE_NOT_EXIST,
    CODE_QUEUE_NOT_EXIST, CODE_RECEIPT_HANDLE_ERROR, CODE_TOPIC_NOT_EXIST,
    STATUS_MESSAGE_NOT_EXIST, STATUS_QUEUE_NOT_EXIST, STATUS_RECEIPT_HANDLE_ERROR,
    STATUS_TOPIC_NOT_EXIST,
};

use crate::resilience::TransientFaultKind;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the MNS integration.
#[derive(Debug, Error)]
pub enum MnsError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Request construction and validation errors.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Message body encoding and digest errors.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Error document returned by the service.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Response parsing errors.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Network and transport errors.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl MnsError {
    /// Short label of the error family, used as a structured logging field.
    pub fn kind_label(&self) -> &'static str {
        match self {
            MnsError::Configuration(_) => "configuration",
            MnsError::Request(_) => "request",
            MnsError::Integrity(IntegrityError::Mismatch { .. }) => "integrity_mismatch",
            MnsError::Integrity(IntegrityError::Encoding { .. }) => "encoding",
            MnsError::Service(_) => "service",
            MnsError::Response(_) => "response",
            MnsError::Network(e) => e.kind_label(),
        }
    }

    /// Returns the transient fault tag if this is a transport failure that
    /// carries one.
    pub fn fault_kind(&self) -> Option<TransientFaultKind> {
        match self {
            MnsError::Network(e) => e.fault_kind(),
            _ => None,
        }
    }

    /// Returns true if the default retry classifier would retry this error.
    pub fn is_retryable(&self) -> bool {
        self.fault_kind()
            .map(crate::resilience::default_fault_classifier)
            .unwrap_or(false)
    }

    /// Returns the HTTP status code if the error came from an HTTP response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MnsError::Service(e) => Some(e.http_status_code),
            MnsError::Response(ResponseError::MalformedErrorResponse { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns the MNS error code if available.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            MnsError::Service(e) => Some(e.code.as_str()),
            _ => None,
        }
    }

    /// Returns the MNS request id if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            MnsError::Service(e) => e.request_id.as_deref(),
            MnsError::Response(ResponseError::MalformedErrorResponse { request_id, .. }) => {
                request_id.as_deref()
            }
            _ => None,
        }
    }

    /// Returns the service error, if this is one.
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            MnsError::Service(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the category of a service error.
    pub fn category(&self) -> Option<ErrorCategory> {
        self.as_service_error().and_then(ServiceError::category)
    }

    /// The queue does not exist.
    pub fn is_queue_not_exist(&self) -> bool {
        self.category() == Some(ErrorCategory::QueueNotExist)
    }

    /// The topic does not exist.
    pub fn is_topic_not_exist(&self) -> bool {
        self.category() == Some(ErrorCategory::TopicNotExist)
    }

    /// The message does not exist.
    pub fn is_message_not_exist(&self) -> bool {
        self.category() == Some(ErrorCategory::MessageNotExist)
    }

    /// The receipt handle is invalid or expired.
    pub fn is_receipt_handle_error(&self) -> bool {
        self.category() == Some(ErrorCategory::ReceiptHandleError)
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing access key id or secret.
    #[error("Missing credentials: access key id and secret must be specified via config or environment")]
    MissingCredentials,

    /// Missing endpoint.
    #[error("Missing endpoint: endpoint must be specified via config or environment")]
    MissingEndpoint,

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL: {url} ({details})")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Details about the validation error.
        details: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// Request construction and validation errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// General validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Details about the validation error.
        message: String,
    },

    /// The target URL could not be parsed.
    #[error("Malformed URL '{url}': {message}")]
    MalformedUrl {
        /// The raw URL.
        url: String,
        /// Parser error message.
        message: String,
    },

    /// A header name or value could not be represented.
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Error message.
        message: String,
    },

    /// The request document could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

/// Message body integrity errors.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The MD5 reported by the service does not match the local digest.
    #[error(
        "MessageBodyMD5 mismatch: expected {expected}, observed {observed}, base64(MessageBody): {}",
        STANDARD.encode(.message_body)
    )]
    Mismatch {
        /// The message body the digest was computed over.
        message_body: Vec<u8>,
        /// Digest computed locally (uppercase hex).
        expected: String,
        /// Digest reported by the service.
        observed: String,
    },

    /// Transport encoding of the message body is malformed.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Error message.
        message: String,
    },
}

/// Error document returned by MNS for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (HTTP {http_status_code}): {message}")]
pub struct ServiceError {
    /// HTTP status code of the response.
    pub http_status_code: u16,
    /// MNS error code, e.g. `QueueNotExist`.
    pub code: String,
    /// Detailed error message.
    pub message: String,
    /// Request id, from the document or the `x-mns-request-id` header.
    pub request_id: Option<String>,
    /// Identifies the MNS region that served the request.
    pub host_id: Option<String>,
}

impl ServiceError {
    /// Returns the category matching this error's `(status, code)` pair.
    pub fn category(&self) -> Option<ErrorCategory> {
        classify(self.http_status_code, &self.code)
    }
}

/// Response parsing errors.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// A non-2xx response whose body is not a valid MNS error document.
    #[error("Malformed error response (HTTP {status}): {message}; body: {}", String::from_utf8_lossy(.body))]
    MalformedErrorResponse {
        /// HTTP status code.
        status: u16,
        /// Request id from the response headers, if any.
        request_id: Option<String>,
        /// Raw response body.
        body: Vec<u8>,
        /// Parser error message.
        message: String,
    },

    /// A 2xx response whose body could not be parsed.
    #[error("XML parse error: {message}; body: {}", String::from_utf8_lossy(.body))]
    XmlParseError {
        /// Parser error message.
        message: String,
        /// Raw response body.
        body: Vec<u8>,
    },

    /// A batch response does not have one item per request item.
    #[error("Result message count mismatch: expected {expected}, got {actual}")]
    MessageCountMismatch {
        /// Number of items sent.
        expected: usize,
        /// Number of items returned.
        actual: usize,
    },
}

/// Network and transport errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// A connection-level fault typical of idle-connection races.
    #[error("Transient fault ({kind}): {message}")]
    Transient {
        /// Fault tag consumed by the retry classifier.
        kind: TransientFaultKind,
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// Time spent on the attempt before the deadline.
        duration: Duration,
    },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    TlsError {
        /// Error message.
        message: String,
    },
}

impl NetworkError {
    /// Returns the transient fault tag, if any.
    pub fn fault_kind(&self) -> Option<TransientFaultKind> {
        match self {
            NetworkError::Transient { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn kind_label(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "connection_failed",
            NetworkError::Transient { .. } => "transient",
            NetworkError::Timeout { .. } => "timeout",
            NetworkError::TlsError { .. } => "tls",
        }
    }
}
