//! Queue and topic operations built on the request executor.

mod queue;
mod topic;

pub use queue::{QueueService, MAX_BATCH_SIZE, MAX_WAIT_SECONDS};
pub use topic::TopicService;

use crate::codec::{decode, encode_to_string, message_body_md5, verify_message_body_md5};
use crate::config::MnsConfig;
use crate::error::{MnsError, RequestError};
use crate::executor::{CallContext, RawResponse, RequestExecutor};
use crate::pool::BufferPool;
use crate::types::MnsResponse;
use crate::url_cache::UrlCache;
use http::{HeaderMap, Method};
use std::sync::Arc;
use url::Url;

/// Dependencies shared by every service of a client.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    config: Arc<MnsConfig>,
    executor: Arc<RequestExecutor>,
    buffers: Arc<BufferPool>,
    urls: Arc<UrlCache>,
}

impl ServiceContext {
    /// Create a new service context.
    pub fn new(
        config: Arc<MnsConfig>,
        executor: Arc<RequestExecutor>,
        buffers: Arc<BufferPool>,
        urls: Arc<UrlCache>,
    ) -> Self {
        Self {
            config,
            executor,
            buffers,
            urls,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &MnsConfig {
        &self.config
    }

    /// Get the buffer pool.
    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    /// Get the URL cache.
    pub fn urls(&self) -> &UrlCache {
        &self.urls
    }

    /// Get the request executor.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// The message body as it travels in the XML document.
    fn wire_body(&self, body: &[u8]) -> Result<String, MnsError> {
        if body.is_empty() {
            return Err(RequestError::Validation {
                message: "the MessageBody must not be empty".to_string(),
            }
            .into());
        }
        if self.config.base64_enabled {
            return Ok(encode_to_string(body));
        }
        String::from_utf8(body.to_vec()).map_err(|_| {
            RequestError::Validation {
                message: "the MessageBody must be valid UTF-8 when base64 encoding is disabled"
                    .to_string(),
            }
            .into()
        })
    }

    /// Verify a received body against its reported digest and undo the
    /// transport encoding. Returns the body and its digest.
    fn open_body(&self, wire: String, reported_md5: &str) -> Result<(Vec<u8>, String), MnsError> {
        verify_message_body_md5(wire.as_bytes(), reported_md5)?;

        if self.config.base64_enabled && !wire.is_empty() {
            let body = decode(wire.as_bytes())?;
            let digest = message_body_md5(&body);
            return Ok((body, digest));
        }
        Ok((wire.into_bytes(), reported_md5.to_ascii_uppercase()))
    }

    /// Execute a call with pooled response buffering and hand the raw
    /// response to `handle`.
    async fn call<T, F>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &Url,
        body: Option<&[u8]>,
        handle: F,
    ) -> Result<MnsResponse<T>, MnsError>
    where
        F: FnOnce(&RawResponse<'_>) -> Result<T, MnsError>,
    {
        let mut response_buffer = self.buffers.checkout();
        let response = self
            .executor
            .execute(
                ctx,
                method,
                url,
                &HeaderMap::new(),
                body,
                &mut response_buffer,
            )
            .await?;

        let value = handle(&response)?;
        Ok(MnsResponse::new(response.request_id, value))
    }
}

/// Body of a successful response, or the decoded error.
fn success_body<'a>(response: &'a RawResponse<'_>) -> Result<&'a [u8], MnsError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(response.to_error())
    }
}
