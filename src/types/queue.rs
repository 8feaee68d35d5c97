//! Queue message types.

use super::time_from_unix_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Message body. Must be valid UTF-8 unless base64 encoding is enabled.
    pub message_body: Vec<u8>,
    /// Seconds before the message becomes visible.
    pub delay_seconds: Option<u32>,
    /// Priority, 1 (highest) to 16.
    pub priority: Option<u32>,
}

impl SendMessageRequest {
    /// Create a request with the given body.
    pub fn new(message_body: impl Into<Vec<u8>>) -> Self {
        Self {
            message_body: message_body.into(),
            delay_seconds: None,
            priority: None,
        }
    }

    /// Set the delivery delay.
    pub fn with_delay_seconds(mut self, seconds: u32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageResponse {
    /// Message id.
    pub message_id: String,
    /// MD5 of the stored body, uppercase hex.
    pub message_body_md5: String,
    /// Receipt handle, returned for delayed messages.
    pub receipt_handle: Option<String>,
}

/// Per-message result of a batch send.
///
/// Either the error fields or the message fields are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSendMessageResultItem {
    /// Error code when this message was rejected.
    pub error_code: Option<String>,
    /// Error message when this message was rejected.
    pub error_message: Option<String>,
    /// Message id.
    pub message_id: String,
    /// MD5 of the stored body, uppercase hex.
    pub message_body_md5: String,
    /// Receipt handle, returned for delayed messages.
    pub receipt_handle: Option<String>,
}

impl BatchSendMessageResultItem {
    /// Returns true if this message was accepted.
    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }
}

/// A received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message id.
    pub message_id: String,
    /// Handle used to delete the message or change its visibility.
    pub receipt_handle: String,
    /// Message body, base64-decoded when encoding is enabled.
    pub message_body: Vec<u8>,
    /// MD5 of `message_body`, uppercase hex.
    pub message_body_md5: String,
    /// Enqueue time in Unix milliseconds.
    pub enqueue_time: i64,
    /// Next visible time in Unix milliseconds.
    pub next_visible_time: i64,
    /// First dequeue time in Unix milliseconds.
    pub first_dequeue_time: i64,
    /// Number of times the message was dequeued.
    pub dequeue_count: u32,
    /// Priority.
    pub priority: u32,
}

impl Message {
    /// Enqueue time.
    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        time_from_unix_millis(self.enqueue_time)
    }

    /// Next visible time.
    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        time_from_unix_millis(self.next_visible_time)
    }

    /// First dequeue time.
    pub fn first_dequeued_at(&self) -> Option<DateTime<Utc>> {
        time_from_unix_millis(self.first_dequeue_time)
    }
}

/// A message seen through peek. Peeking does not change visibility, so no
/// receipt handle is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekedMessage {
    /// Message id.
    pub message_id: String,
    /// Message body, base64-decoded when encoding is enabled.
    pub message_body: Vec<u8>,
    /// MD5 of `message_body`, uppercase hex.
    pub message_body_md5: String,
    /// Enqueue time in Unix milliseconds.
    pub enqueue_time: i64,
    /// First dequeue time in Unix milliseconds.
    pub first_dequeue_time: i64,
    /// Number of times the message was dequeued.
    pub dequeue_count: u32,
    /// Priority.
    pub priority: u32,
}

impl PeekedMessage {
    /// Enqueue time.
    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        time_from_unix_millis(self.enqueue_time)
    }
}

/// A receipt handle that could not be deleted in a batch delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteMessageErrorItem {
    /// Error code.
    pub error_code: String,
    /// Error message.
    pub error_message: String,
    /// The receipt handle that failed.
    pub receipt_handle: String,
}

/// Result of a visibility change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMessageVisibilityResponse {
    /// New receipt handle; the previous one is no longer valid.
    pub receipt_handle: String,
    /// Next visible time in Unix milliseconds.
    pub next_visible_time: i64,
}

impl ChangeMessageVisibilityResponse {
    /// Next visible time.
    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        time_from_unix_millis(self.next_visible_time)
    }
}

// Wire documents.

#[derive(Debug, Serialize)]
#[serde(rename = "Message")]
pub(crate) struct SendMessageDocument<'a> {
    #[serde(rename = "MessageBody")]
    pub message_body: &'a str,
    #[serde(rename = "DelaySeconds", skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,
    #[serde(rename = "Priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "Messages")]
pub(crate) struct BatchSendMessageDocument<'a> {
    #[serde(rename = "Message")]
    pub messages: Vec<SendMessageDocument<'a>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageResult {
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    #[serde(rename = "MessageBodyMD5", default)]
    pub message_body_md5: String,
    #[serde(rename = "ReceiptHandle", default)]
    pub receipt_handle: Option<String>,
}

impl From<SendMessageResult> for SendMessageResponse {
    fn from(result: SendMessageResult) -> Self {
        Self {
            message_id: result.message_id,
            message_body_md5: result.message_body_md5,
            receipt_handle: result.receipt_handle.filter(|h| !h.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchSendMessageItemDocument {
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    #[serde(rename = "MessageBodyMD5", default)]
    pub message_body_md5: String,
    #[serde(rename = "ReceiptHandle", default)]
    pub receipt_handle: Option<String>,
}

impl BatchSendMessageItemDocument {
    pub fn is_error(&self) -> bool {
        self.error_code.as_deref().map_or(false, |c| !c.is_empty())
    }
}

impl From<BatchSendMessageItemDocument> for BatchSendMessageResultItem {
    fn from(item: BatchSendMessageItemDocument) -> Self {
        Self {
            error_code: item.error_code.filter(|c| !c.is_empty()),
            error_message: item.error_message.filter(|m| !m.is_empty()),
            message_id: item.message_id,
            message_body_md5: item.message_body_md5,
            receipt_handle: item.receipt_handle.filter(|h| !h.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchSendMessageResult {
    #[serde(rename = "Message", default)]
    pub messages: Vec<BatchSendMessageItemDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageDocument {
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    #[serde(rename = "ReceiptHandle", default)]
    pub receipt_handle: String,
    #[serde(rename = "MessageBody", default)]
    pub message_body: String,
    #[serde(rename = "MessageBodyMD5", default)]
    pub message_body_md5: String,
    #[serde(rename = "EnqueueTime", default)]
    pub enqueue_time: i64,
    #[serde(rename = "NextVisibleTime", default)]
    pub next_visible_time: i64,
    #[serde(rename = "FirstDequeueTime", default)]
    pub first_dequeue_time: i64,
    #[serde(rename = "DequeueCount", default)]
    pub dequeue_count: u32,
    #[serde(rename = "Priority", default)]
    pub priority: u32,
}

impl MessageDocument {
    pub fn into_message(self, message_body: Vec<u8>, message_body_md5: String) -> Message {
        Message {
            message_id: self.message_id,
            receipt_handle: self.receipt_handle,
            message_body,
            message_body_md5,
            enqueue_time: self.enqueue_time,
            next_visible_time: self.next_visible_time,
            first_dequeue_time: self.first_dequeue_time,
            dequeue_count: self.dequeue_count,
            priority: self.priority,
        }
    }

    pub fn into_peeked(self, message_body: Vec<u8>, message_body_md5: String) -> PeekedMessage {
        PeekedMessage {
            message_id: self.message_id,
            message_body,
            message_body_md5,
            enqueue_time: self.enqueue_time,
            first_dequeue_time: self.first_dequeue_time,
            dequeue_count: self.dequeue_count,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesDocument {
    #[serde(rename = "Message", default)]
    pub messages: Vec<MessageDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "ReceiptHandles")]
pub(crate) struct ReceiptHandlesDocument<'a> {
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handles: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchDeleteErrorDocument {
    #[serde(rename = "ErrorCode", default)]
    pub error_code: String,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: String,
    #[serde(rename = "ReceiptHandle", default)]
    pub receipt_handle: String,
}

impl From<BatchDeleteErrorDocument> for BatchDeleteMessageErrorItem {
    fn from(item: BatchDeleteErrorDocument) -> Self {
        Self {
            error_code: item.error_code,
            error_message: item.error_message,
            receipt_handle: item.receipt_handle,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchDeleteErrorsDocument {
    #[serde(rename = "Error", default)]
    pub errors: Vec<BatchDeleteErrorDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangeVisibilityDocument {
    #[serde(rename = "ReceiptHandle", default)]
    pub receipt_handle: String,
    #[serde(rename = "NextVisibleTime", default)]
    pub next_visible_time: i64,
}

impl From<ChangeVisibilityDocument> for ChangeMessageVisibilityResponse {
    fn from(document: ChangeVisibilityDocument) -> Self {
        Self {
            receipt_handle: document.receipt_handle,
            next_visible_time: document.next_visible_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{read_xml, write_xml};
    use bytes::BytesMut;

    #[test]
    fn test_send_document_omits_unset_fields() {
        let mut buf = BytesMut::new();
        let document = SendMessageDocument {
            message_body: "hello",
            delay_seconds: None,
            priority: Some(8),
        };
        write_xml(&mut buf, &document).unwrap();
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "<Message><MessageBody>hello</MessageBody><Priority>8</Priority></Message>"
        );
    }

    #[test]
    fn test_receipt_handles_document() {
        let mut buf = BytesMut::new();
        let handles = vec!["a".to_string(), "b".to_string()];
        write_xml(
            &mut buf,
            &ReceiptHandlesDocument {
                receipt_handles: &handles,
            },
        )
        .unwrap();
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "<ReceiptHandles><ReceiptHandle>a</ReceiptHandle><ReceiptHandle>b</ReceiptHandle></ReceiptHandles>"
        );
    }

    #[test]
    fn test_read_message_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mns.aliyuncs.com/doc/v1/">
  <MessageId>5F290C926D472878-2-14D9529A8FA-200000001</MessageId>
  <ReceiptHandle>1-ODU4OTkzNDU5My0xNDMyNzI3ODI3LTItOA==</ReceiptHandle>
  <MessageBodyMD5>C5DD56A39F5F7BB8B3337C6D11B6D8C7</MessageBodyMD5>
  <MessageBody>This is a test message</MessageBody>
  <EnqueueTime>1250700979248</EnqueueTime>
  <NextVisibleTime>1250700799348</NextVisibleTime>
  <FirstDequeueTime>1250700779318</FirstDequeueTime>
  <DequeueCount>1</DequeueCount>
  <Priority>8</Priority>
</Message>"#;
        let document: MessageDocument = read_xml(xml.as_bytes()).unwrap();
        assert_eq!(document.message_id, "5F290C926D472878-2-14D9529A8FA-200000001");
        assert_eq!(document.message_body, "This is a test message");
        assert_eq!(document.enqueue_time, 1250700979248);
        assert_eq!(document.dequeue_count, 1);
        assert_eq!(document.priority, 8);
    }

    #[test]
    fn test_read_batch_send_result() {
        let xml = r#"<Messages xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Message>
    <ErrorCode>MessageNotExist</ErrorCode>
    <ErrorMessage>bad</ErrorMessage>
  </Message>
  <Message>
    <MessageId>id-2</MessageId>
    <MessageBodyMD5>C5DD56A39F5F7BB8B3337C6D11B6D8C7</MessageBodyMD5>
  </Message>
</Messages>"#;
        let result: BatchSendMessageResult = read_xml(xml.as_bytes()).unwrap();
        assert_eq!(result.messages.len(), 2);
        assert!(result.messages[0].is_error());
        assert!(!result.messages[1].is_error());

        let items: Vec<BatchSendMessageResultItem> =
            result.messages.into_iter().map(Into::into).collect();
        assert!(!items[0].is_success());
        assert!(items[1].is_success());
        assert_eq!(items[1].message_id, "id-2");
    }
}
