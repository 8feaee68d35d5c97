//! Topic service for publishing messages.

use super::{success_body, ServiceContext};
use crate::codec::verify_message_body_md5;
use crate::error::{MnsError, RequestError};
use crate::executor::CallContext;
use crate::types::{
    MnsResponse, PublishMessageDocument, PublishMessageRequest, PublishMessageResponse,
    PublishMessageResult, MAX_MESSAGE_TAG_LEN,
};
use crate::xml::{read_xml, write_xml};
use http::Method;

/// Service for publishing to one topic.
#[derive(Debug, Clone)]
pub struct TopicService {
    ctx: ServiceContext,
    name: String,
    base_url: String,
}

impl TopicService {
    /// Create a topic service. The topic URL is `<endpoint>/topics/<name>`.
    pub fn new(ctx: ServiceContext, name: impl Into<String>) -> Self {
        let name = name.into();
        let base_url = ctx.config().resource_url("topics", &name);
        Self {
            ctx,
            name,
            base_url,
        }
    }

    /// Get the topic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish a message.
    pub async fn publish_message(
        &self,
        request: PublishMessageRequest,
    ) -> Result<MnsResponse<PublishMessageResponse>, MnsError> {
        self.publish_message_with_context(&CallContext::new(), request)
            .await
    }

    /// Publish a message under `ctx`.
    pub async fn publish_message_with_context(
        &self,
        ctx: &CallContext,
        request: PublishMessageRequest,
    ) -> Result<MnsResponse<PublishMessageResponse>, MnsError> {
        if let Some(tag) = &request.message_tag {
            if tag.len() > MAX_MESSAGE_TAG_LEN {
                return Err(RequestError::Validation {
                    message: format!(
                        "the MessageTag must be at most {} bytes, got {}",
                        MAX_MESSAGE_TAG_LEN,
                        tag.len()
                    ),
                }
                .into());
            }
        }
        let body = self.ctx.wire_body(&request.message_body)?;
        let url = self
            .ctx
            .urls()
            .resolve(&format!("{}/messages", self.base_url))?;

        let mut request_buffer = self.ctx.buffers().checkout();
        write_xml(
            &mut request_buffer,
            &PublishMessageDocument {
                message_body: &body,
                message_tag: request.message_tag.as_deref(),
            },
        )?;

        self.ctx
            .call(ctx, Method::POST, &url, Some(&request_buffer[..]), |response| {
                let result: PublishMessageResult = read_xml(success_body(response)?)?;
                verify_message_body_md5(body.as_bytes(), &result.message_body_md5)?;
                Ok(PublishMessageResponse::from(result))
            })
            .await
    }
}
