//! Topic message types.

use serde::{Deserialize, Serialize};

/// Longest accepted message tag, in bytes.
pub const MAX_MESSAGE_TAG_LEN: usize = 16;

/// Request to publish one message to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMessageRequest {
    /// Message body. Must be valid UTF-8 unless base64 encoding is enabled.
    pub message_body: Vec<u8>,
    /// Optional tag used by subscription filters.
    pub message_tag: Option<String>,
}

impl PublishMessageRequest {
    /// Create a request with the given body.
    pub fn new(message_body: impl Into<Vec<u8>>) -> Self {
        Self {
            message_body: message_body.into(),
            message_tag: None,
        }
    }

    /// Set the message tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.message_tag = Some(tag.into());
        self
    }
}

/// Acknowledgement of a published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMessageResponse {
    /// Message id.
    pub message_id: String,
    /// MD5 of the stored body, uppercase hex.
    pub message_body_md5: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "Message")]
pub(crate) struct PublishMessageDocument<'a> {
    #[serde(rename = "MessageBody")]
    pub message_body: &'a str,
    #[serde(rename = "MessageTag", skip_serializing_if = "Option::is_none")]
    pub message_tag: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishMessageResult {
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    #[serde(rename = "MessageBodyMD5", default)]
    pub message_body_md5: String,
}

impl From<PublishMessageResult> for PublishMessageResponse {
    fn from(result: PublishMessageResult) -> Self {
        Self {
            message_id: result.message_id,
            message_body_md5: result.message_body_md5,
        }
    }
}
