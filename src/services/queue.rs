//! Queue service for MNS message operations.

use super::{success_body, ServiceContext};
use crate::codec::verify_message_body_md5;
use crate::error::{MnsError, RequestError, ResponseError};
use crate::executor::CallContext;
use crate::types::*;
use crate::xml::{contains, element_texts, read_xml, write_xml};
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use url::Url;

/// Largest number of messages or receipt handles in one batch call.
pub const MAX_BATCH_SIZE: usize = 16;

/// Longest long-polling wait, in seconds.
pub const MAX_WAIT_SECONDS: i32 = 30;

/// Extra time allowed on top of the long-polling wait.
const WAIT_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Characters kept as-is in an escaped query value.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Service for operations on one queue.
#[derive(Debug, Clone)]
pub struct QueueService {
    ctx: ServiceContext,
    name: String,
    base_url: String,
}

impl QueueService {
    /// Create a queue service. The queue URL is `<endpoint>/queues/<name>`.
    pub fn new(ctx: ServiceContext, name: impl Into<String>) -> Self {
        let name = name.into();
        let base_url = ctx.config().resource_url("queues", &name);
        Self {
            ctx,
            name,
            base_url,
        }
    }

    /// Get the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn messages_url(&self, query: &str) -> Result<std::sync::Arc<Url>, MnsError> {
        let raw = if query.is_empty() {
            format!("{}/messages", self.base_url)
        } else {
            format!("{}/messages?{}", self.base_url, query)
        };
        self.ctx.urls().resolve(&raw)
    }

    /// URLs carrying a receipt handle are unique per message and bypass the
    /// cache.
    fn receipt_handle_url(&self, query: &str) -> Result<Url, MnsError> {
        let raw = format!("{}/messages?{}", self.base_url, query);
        Url::parse(&raw).map_err(|e| {
            RequestError::MalformedUrl {
                url: raw,
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Send a message.
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<MnsResponse<SendMessageResponse>, MnsError> {
        self.send_message_with_context(&CallContext::new(), request)
            .await
    }

    /// Send a message under `ctx`.
    pub async fn send_message_with_context(
        &self,
        ctx: &CallContext,
        request: SendMessageRequest,
    ) -> Result<MnsResponse<SendMessageResponse>, MnsError> {
        let body = self.ctx.wire_body(&request.message_body)?;
        let url = self.messages_url("")?;

        let mut request_buffer = self.ctx.buffers().checkout();
        write_xml(
            &mut request_buffer,
            &SendMessageDocument {
                message_body: &body,
                delay_seconds: request.delay_seconds,
                priority: request.priority,
            },
        )?;

        self.ctx
            .call(ctx, Method::POST, &url, Some(&request_buffer[..]), |response| {
                let result: SendMessageResult = read_xml(success_body(response)?)?;
                verify_message_body_md5(body.as_bytes(), &result.message_body_md5)?;
                Ok(SendMessageResponse::from(result))
            })
            .await
    }

    /// Send up to 16 messages in one call.
    ///
    /// The service answers a partially accepted batch with HTTP 500 and a
    /// per-message result document; that case is returned as `Ok` with the
    /// rejected items carrying their error code.
    pub async fn batch_send_message(
        &self,
        requests: Vec<SendMessageRequest>,
    ) -> Result<MnsResponse<Vec<BatchSendMessageResultItem>>, MnsError> {
        self.batch_send_message_with_context(&CallContext::new(), requests)
            .await
    }

    /// Send up to 16 messages in one call under `ctx`.
    pub async fn batch_send_message_with_context(
        &self,
        ctx: &CallContext,
        requests: Vec<SendMessageRequest>,
    ) -> Result<MnsResponse<Vec<BatchSendMessageResultItem>>, MnsError> {
        check_batch_size("messages", requests.len())?;
        let bodies = requests
            .iter()
            .map(|r| self.ctx.wire_body(&r.message_body))
            .collect::<Result<Vec<_>, _>>()?;
        let url = self.messages_url("")?;

        let document = BatchSendMessageDocument {
            messages: requests
                .iter()
                .zip(&bodies)
                .map(|(request, body)| SendMessageDocument {
                    message_body: body,
                    delay_seconds: request.delay_seconds,
                    priority: request.priority,
                })
                .collect(),
        };
        let mut request_buffer = self.ctx.buffers().checkout();
        write_xml(&mut request_buffer, &document)?;

        self.ctx
            .call(ctx, Method::POST, &url, Some(&request_buffer[..]), |response| {
                let partial = response.status == 500
                    && contains(response.body, b"</Messages>")
                    && contains(response.body, b"</Message>");
                let body = if partial {
                    response.body
                } else {
                    success_body(response)?
                };

                let result: BatchSendMessageResult = read_xml(body)?;
                if result.messages.len() != bodies.len() {
                    return Err(ResponseError::MessageCountMismatch {
                        expected: bodies.len(),
                        actual: result.messages.len(),
                    }
                    .into());
                }
                for (item, sent) in result.messages.iter().zip(&bodies) {
                    if !item.is_error() {
                        verify_message_body_md5(sent.as_bytes(), &item.message_body_md5)?;
                    }
                }
                Ok(result
                    .messages
                    .into_iter()
                    .map(BatchSendMessageResultItem::from)
                    .collect::<Vec<_>>())
            })
            .await
    }

    /// Receive one message, long-polling up to `wait_seconds`.
    ///
    /// Values outside `0..=30` are treated as 30.
    pub async fn receive_message(
        &self,
        wait_seconds: i32,
    ) -> Result<MnsResponse<Message>, MnsError> {
        self.receive_message_with_context(&CallContext::new(), wait_seconds)
            .await
    }

    /// Receive one message under `ctx`.
    pub async fn receive_message_with_context(
        &self,
        ctx: &CallContext,
        wait_seconds: i32,
    ) -> Result<MnsResponse<Message>, MnsError> {
        let wait_seconds = clamp_wait_seconds(wait_seconds);
        let ctx = ctx.with_min_timeout(wait_timeout(wait_seconds));

        let query = if wait_seconds > 0 {
            format!("waitseconds={}", wait_seconds)
        } else {
            String::new()
        };
        let url = self.messages_url(&query)?;

        self.ctx
            .call(&ctx, Method::GET, &url, None, |response| {
                let mut document = read_message(success_body(response)?)?;
                let wire = std::mem::take(&mut document.message_body);
                let (body, md5) = self.ctx.open_body(wire, &document.message_body_md5)?;
                Ok(document.into_message(body, md5))
            })
            .await
    }

    /// Receive up to `num_of_messages` messages.
    ///
    /// `num_of_messages` outside `1..=16` is treated as 16 and
    /// `wait_seconds` outside `0..=30` as 30.
    pub async fn batch_receive_message(
        &self,
        num_of_messages: i32,
        wait_seconds: i32,
    ) -> Result<MnsResponse<Vec<Message>>, MnsError> {
        self.batch_receive_message_with_context(&CallContext::new(), num_of_messages, wait_seconds)
            .await
    }

    /// Receive up to `num_of_messages` messages under `ctx`.
    pub async fn batch_receive_message_with_context(
        &self,
        ctx: &CallContext,
        num_of_messages: i32,
        wait_seconds: i32,
    ) -> Result<MnsResponse<Vec<Message>>, MnsError> {
        let num_of_messages = clamp_batch_count(num_of_messages);
        let wait_seconds = clamp_wait_seconds(wait_seconds);
        let ctx = ctx.with_min_timeout(wait_timeout(wait_seconds));

        let mut query = format!("numOfMessages={}", num_of_messages);
        if wait_seconds > 0 {
            query.push_str(&format!("&waitseconds={}", wait_seconds));
        }
        let url = self.messages_url(&query)?;

        self.ctx
            .call(&ctx, Method::GET, &url, None, |response| {
                read_messages(success_body(response)?)?
                    .into_iter()
                    .map(|mut message| -> Result<Message, MnsError> {
                        let wire = std::mem::take(&mut message.message_body);
                        let (body, md5) = self.ctx.open_body(wire, &message.message_body_md5)?;
                        Ok(message.into_message(body, md5))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
    }

    /// Look at the next message without changing its visibility.
    pub async fn peek_message(&self) -> Result<MnsResponse<PeekedMessage>, MnsError> {
        self.peek_message_with_context(&CallContext::new()).await
    }

    /// Look at the next message under `ctx`.
    pub async fn peek_message_with_context(
        &self,
        ctx: &CallContext,
    ) -> Result<MnsResponse<PeekedMessage>, MnsError> {
        let url = self.messages_url("peekonly=true")?;

        self.ctx
            .call(ctx, Method::GET, &url, None, |response| {
                let mut document = read_message(success_body(response)?)?;
                let wire = std::mem::take(&mut document.message_body);
                let (body, md5) = self.ctx.open_body(wire, &document.message_body_md5)?;
                Ok(document.into_peeked(body, md5))
            })
            .await
    }

    /// Look at up to `num_of_messages` messages. Values outside `1..=16` are
    /// treated as 16.
    pub async fn batch_peek_message(
        &self,
        num_of_messages: i32,
    ) -> Result<MnsResponse<Vec<PeekedMessage>>, MnsError> {
        self.batch_peek_message_with_context(&CallContext::new(), num_of_messages)
            .await
    }

    /// Look at up to `num_of_messages` messages under `ctx`.
    pub async fn batch_peek_message_with_context(
        &self,
        ctx: &CallContext,
        num_of_messages: i32,
    ) -> Result<MnsResponse<Vec<PeekedMessage>>, MnsError> {
        let query = format!(
            "peekonly=true&numOfMessages={}",
            clamp_batch_count(num_of_messages)
        );
        let url = self.messages_url(&query)?;

        self.ctx
            .call(ctx, Method::GET, &url, None, |response| {
                read_messages(success_body(response)?)?
                    .into_iter()
                    .map(|mut message| -> Result<PeekedMessage, MnsError> {
                        let wire = std::mem::take(&mut message.message_body);
                        let (body, md5) = self.ctx.open_body(wire, &message.message_body_md5)?;
                        Ok(message.into_peeked(body, md5))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
    }

    /// Delete a received message.
    pub async fn delete_message(&self, receipt_handle: &str) -> Result<MnsResponse<()>, MnsError> {
        self.delete_message_with_context(&CallContext::new(), receipt_handle)
            .await
    }

    /// Delete a received message under `ctx`.
    pub async fn delete_message_with_context(
        &self,
        ctx: &CallContext,
        receipt_handle: &str,
    ) -> Result<MnsResponse<()>, MnsError> {
        let url = self.receipt_handle_url(&format!(
            "ReceiptHandle={}",
            escape_query_value(receipt_handle)
        ))?;

        self.ctx
            .call(ctx, Method::DELETE, &url, None, |response| {
                success_body(response).map(|_| ())
            })
            .await
    }

    /// Delete up to 16 messages.
    ///
    /// Handles the service could not delete are returned as items; the call
    /// itself only fails when the whole request failed.
    pub async fn batch_delete_message(
        &self,
        receipt_handles: Vec<String>,
    ) -> Result<MnsResponse<Vec<BatchDeleteMessageErrorItem>>, MnsError> {
        self.batch_delete_message_with_context(&CallContext::new(), receipt_handles)
            .await
    }

    /// Delete up to 16 messages under `ctx`.
    pub async fn batch_delete_message_with_context(
        &self,
        ctx: &CallContext,
        receipt_handles: Vec<String>,
    ) -> Result<MnsResponse<Vec<BatchDeleteMessageErrorItem>>, MnsError> {
        check_batch_size("receipt handles", receipt_handles.len())?;
        let url = self.messages_url("")?;

        let mut request_buffer = self.ctx.buffers().checkout();
        write_xml(
            &mut request_buffer,
            &ReceiptHandlesDocument {
                receipt_handles: &receipt_handles,
            },
        )?;

        self.ctx
            .call(ctx, Method::DELETE, &url, Some(&request_buffer[..]), |response| {
                if response.is_success() {
                    return Ok(Vec::new());
                }
                let partial = response.status == 404
                    && contains(response.body, b"</Errors>")
                    && contains(response.body, b"<ReceiptHandle>");
                if !partial {
                    return Err(response.to_error());
                }

                let document: BatchDeleteErrorsDocument = read_xml(response.body)?;
                Ok(document
                    .errors
                    .into_iter()
                    .map(BatchDeleteMessageErrorItem::from)
                    .collect::<Vec<_>>())
            })
            .await
    }

    /// Extend or shorten how long a received message stays invisible.
    pub async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<MnsResponse<ChangeMessageVisibilityResponse>, MnsError> {
        self.change_message_visibility_with_context(
            &CallContext::new(),
            receipt_handle,
            visibility_timeout,
        )
        .await
    }

    /// Change message visibility under `ctx`.
    pub async fn change_message_visibility_with_context(
        &self,
        ctx: &CallContext,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<MnsResponse<ChangeMessageVisibilityResponse>, MnsError> {
        let url = self.receipt_handle_url(&format!(
            "receiptHandle={}&visibilityTimeout={}",
            escape_query_value(receipt_handle),
            visibility_timeout
        ))?;

        self.ctx
            .call(ctx, Method::PUT, &url, None, |response| {
                let document: ChangeVisibilityDocument = read_xml(success_body(response)?)?;
                Ok(ChangeMessageVisibilityResponse::from(document))
            })
            .await
    }
}

fn read_message(body: &[u8]) -> Result<MessageDocument, MnsError> {
    let mut document: MessageDocument = read_xml(body)?;
    restore_message_bodies(body, std::slice::from_mut(&mut document))?;
    Ok(document)
}

fn read_messages(body: &[u8]) -> Result<Vec<MessageDocument>, MnsError> {
    let mut document: MessagesDocument = read_xml(body)?;
    restore_message_bodies(body, &mut document.messages)?;
    Ok(document.messages)
}

/// Replace serde-trimmed bodies with the exact text from the document.
fn restore_message_bodies(body: &[u8], messages: &mut [MessageDocument]) -> Result<(), MnsError> {
    let texts = element_texts(body, "MessageBody")?;
    if texts.len() != messages.len() {
        return Err(ResponseError::XmlParseError {
            message: format!(
                "expected {} MessageBody elements, found {}",
                messages.len(),
                texts.len()
            ),
            body: body.to_vec(),
        }
        .into());
    }
    for (message, text) in messages.iter_mut().zip(texts) {
        message.message_body = text;
    }
    Ok(())
}

fn check_batch_size(what: &str, len: usize) -> Result<(), MnsError> {
    if (1..=MAX_BATCH_SIZE).contains(&len) {
        return Ok(());
    }
    Err(RequestError::Validation {
        message: format!(
            "the number of {} must be between 1 and {}, got {}",
            what, MAX_BATCH_SIZE, len
        ),
    }
    .into())
}

fn clamp_wait_seconds(wait_seconds: i32) -> i32 {
    if (0..=MAX_WAIT_SECONDS).contains(&wait_seconds) {
        wait_seconds
    } else {
        MAX_WAIT_SECONDS
    }
}

fn clamp_batch_count(num_of_messages: i32) -> i32 {
    if (1..=MAX_BATCH_SIZE as i32).contains(&num_of_messages) {
        num_of_messages
    } else {
        MAX_BATCH_SIZE as i32
    }
}

/// Minimum per-attempt timeout for a long-polling call. A zero wait uses the
/// queue's own polling period, which can be up to 30 seconds.
fn wait_timeout(wait_seconds: i32) -> Duration {
    let wait = if wait_seconds == 0 {
        MAX_WAIT_SECONDS
    } else {
        wait_seconds
    };
    Duration::from_secs(wait as u64) + WAIT_TIMEOUT_MARGIN
}

fn escape_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_wait_seconds() {
        assert_eq!(clamp_wait_seconds(0), 0);
        assert_eq!(clamp_wait_seconds(10), 10);
        assert_eq!(clamp_wait_seconds(30), 30);
        assert_eq!(clamp_wait_seconds(31), 30);
        assert_eq!(clamp_wait_seconds(-1), 30);
    }

    #[test]
    fn test_clamp_batch_count() {
        assert_eq!(clamp_batch_count(1), 1);
        assert_eq!(clamp_batch_count(16), 16);
        assert_eq!(clamp_batch_count(0), 16);
        assert_eq!(clamp_batch_count(17), 16);
    }

    #[test]
    fn test_wait_timeout() {
        assert_eq!(wait_timeout(0), Duration::from_secs(40));
        assert_eq!(wait_timeout(5), Duration::from_secs(15));
        assert_eq!(wait_timeout(30), Duration::from_secs(40));
    }

    #[test]
    fn test_escape_query_value() {
        assert_eq!(
            escape_query_value("1-ODU4OTkzNDU5My0xNDMyNzI3ODI3LTItOA=="),
            "1-ODU4OTkzNDU5My0xNDMyNzI3ODI3LTItOA%3D%3D"
        );
        assert_eq!(escape_query_value("a+b/c d"), "a%2Bb%2Fc%20d");
    }

    #[test]
    fn test_check_batch_size() {
        assert!(check_batch_size("messages", 1).is_ok());
        assert!(check_batch_size("messages", 16).is_ok());
        assert!(check_batch_size("messages", 0).is_err());
        assert!(check_batch_size("messages", 17).is_err());
    }
}
