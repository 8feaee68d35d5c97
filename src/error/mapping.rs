//! Mapping of failed MNS responses to typed errors.

use super::*;
use crate::xml::parse_error_document;
use std::error::Error as StdError;

/// HTTP status returned when a queue does not exist.
pub const STATUS_QUEUE_NOT_EXIST: u16 = 404;
/// HTTP status returned when a topic does not exist.
pub const STATUS_TOPIC_NOT_EXIST: u16 = 404;
/// HTTP status returned when a message does not exist.
pub const STATUS_MESSAGE_NOT_EXIST: u16 = 404;
/// HTTP status returned for an invalid receipt handle.
pub const STATUS_RECEIPT_HANDLE_ERROR: u16 = 400;

/// MNS error code for a missing queue.
pub const CODE_QUEUE_NOT_EXIST: &str = "QueueNotExist";
/// MNS error code for a missing topic.
pub const CODE_TOPIC_NOT_EXIST: &str = "TopicNotExist";
/// MNS error code for a missing message.
pub const CODE_MESSAGE_NOT_EXIST: &str = "MessageNotExist";
/// MNS error code for an invalid receipt handle.
pub const CODE_RECEIPT_HANDLE_ERROR: &str = "ReceiptHandleError";

/// Well-known service error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// `(404, QueueNotExist)`.
    QueueNotExist,
    /// `(404, TopicNotExist)`.
    TopicNotExist,
    /// `(404, MessageNotExist)`.
    MessageNotExist,
    /// `(400, ReceiptHandleError)`.
    ReceiptHandleError,
}

/// Classify a `(status, code)` pair. Both parts must match.
pub fn classify(status: u16, code: &str) -> Option<ErrorCategory> {
    match (status, code) {
        (STATUS_QUEUE_NOT_EXIST, CODE_QUEUE_NOT_EXIST) => Some(ErrorCategory::QueueNotExist),
        (STATUS_TOPIC_NOT_EXIST, CODE_TOPIC_NOT_EXIST) => Some(ErrorCategory::TopicNotExist),
        (STATUS_MESSAGE_NOT_EXIST, CODE_MESSAGE_NOT_EXIST) => {
            Some(ErrorCategory::MessageNotExist)
        }
        (STATUS_RECEIPT_HANDLE_ERROR, CODE_RECEIPT_HANDLE_ERROR) => {
            Some(ErrorCategory::ReceiptHandleError)
        }
        _ => None,
    }
}

/// Translate a non-2xx response into an error.
///
/// The body is parsed as an MNS `<Error>` document. If that fails the raw body
/// is kept in a [`ResponseError::MalformedErrorResponse`]. A document without a
/// `RequestId` falls back to the id from the response header. The HTTP status
/// always comes from the response, never from the document.
pub fn decode_error_response(request_id: Option<&str>, status: u16, body: &[u8]) -> MnsError {
    match parse_error_document(body) {
        Ok(document) => {
            let request_id = document
                .request_id
                .filter(|id| !id.is_empty())
                .or_else(|| request_id.map(String::from));

            MnsError::Service(ServiceError {
                http_status_code: status,
                code: document.code,
                message: document.message,
                request_id,
                host_id: document.host_id.filter(|id| !id.is_empty()),
            })
        }
        Err(message) => MnsError::Response(ResponseError::MalformedErrorResponse {
            status,
            request_id: request_id.map(String::from),
            body: body.to_vec(),
            message,
        }),
    }
}

fn category_of(err: Option<&(dyn StdError + 'static)>) -> Option<ErrorCategory> {
    let err = err?;
    if let Some(e) = err.downcast_ref::<MnsError>() {
        return e.category();
    }
    err.downcast_ref::<ServiceError>()
        .and_then(ServiceError::category)
}

/// Returns true if `err` is a queue-not-found service error.
pub fn is_queue_not_exist(err: Option<&(dyn StdError + 'static)>) -> bool {
    category_of(err) == Some(ErrorCategory::QueueNotExist)
}

/// Returns true if `err` is a topic-not-found service error.
pub fn is_topic_not_exist(err: Option<&(dyn StdError + 'static)>) -> bool {
    category_of(err) == Some(ErrorCategory::TopicNotExist)
}

/// Returns true if `err` is a message-not-found service error.
pub fn is_message_not_exist(err: Option<&(dyn StdError + 'static)>) -> bool {
    category_of(err) == Some(ErrorCategory::MessageNotExist)
}

/// Returns true if `err` is an invalid-receipt-handle service error.
pub fn is_receipt_handle_error(err: Option<&(dyn StdError + 'static)>) -> bool {
    category_of(err) == Some(ErrorCategory::ReceiptHandleError)
}
