//! MNS client implementation.
//!
//! This module provides the client entry point and its builder.

use crate::config::MnsConfig;
use crate::error::MnsError;
use crate::executor::RequestExecutor;
use crate::pool::{BufferPool, DEFAULT_BUFFER_CAPACITY};
use crate::resilience::RetryPolicy;
use crate::services::{QueueService, ServiceContext, TopicService};
use crate::signing::MnsSigner;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::url_cache::UrlCache;
use std::sync::Arc;

/// MNS client.
///
/// Cloning is cheap; clones share the transport, buffer pool and URL cache.
#[derive(Debug, Clone)]
pub struct MnsClient {
    ctx: ServiceContext,
}

impl MnsClient {
    /// Create a new client builder.
    pub fn builder() -> MnsClientBuilder {
        MnsClientBuilder::new()
    }

    /// Get a service for the named queue.
    pub fn queue(&self, name: impl Into<String>) -> QueueService {
        QueueService::new(self.ctx.clone(), name)
    }

    /// Get a service for the named topic.
    pub fn topic(&self, name: impl Into<String>) -> TopicService {
        TopicService::new(self.ctx.clone(), name)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &MnsConfig {
        self.ctx.config()
    }
}

/// Builder for MNS client.
pub struct MnsClientBuilder {
    config: Option<MnsConfig>,
    from_env: bool,
    transport: Option<Arc<dyn HttpTransport>>,
    buffers: Option<Arc<BufferPool>>,
    urls: Option<Arc<UrlCache>>,
}

impl MnsClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            from_env: false,
            transport: None,
            buffers: None,
            urls: None,
        }
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: MnsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a specific buffer pool instead of the process-wide one.
    pub fn buffer_pool(mut self, buffers: Arc<BufferPool>) -> Self {
        self.buffers = Some(buffers);
        self
    }

    /// Use a specific URL cache instead of the process-wide one.
    pub fn url_cache(mut self, urls: Arc<UrlCache>) -> Self {
        self.urls = Some(urls);
        self
    }

    /// Build the MNS client.
    pub fn build(self) -> Result<MnsClient, MnsError> {
        let config = match self.config {
            Some(config) => config,
            None if self.from_env => MnsConfig::builder().from_env().build()?,
            None => MnsConfig::builder().build()?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let builder = ReqwestTransport::builder()
                    .connect_timeout(config.connect_timeout)
                    .pool_max_idle_per_host(config.max_idle_connections)
                    .pool_idle_timeout(config.idle_timeout);
                Arc::new(builder.build()?)
            }
        };

        let buffers = self.buffers.unwrap_or_else(|| {
            if config.buffer_capacity == DEFAULT_BUFFER_CAPACITY {
                BufferPool::shared()
            } else {
                Arc::new(BufferPool::with_capacity(config.buffer_capacity))
            }
        });
        let urls = self.urls.unwrap_or_else(UrlCache::shared);

        let signer = Arc::new(MnsSigner::new(config.credentials.clone()));
        let executor = RequestExecutor::new(transport, signer)
            .with_timeout(config.timeout)
            .with_retry_policy(RetryPolicy::new(config.retry.clone()));

        Ok(MnsClient {
            ctx: ServiceContext::new(Arc::new(config), Arc::new(executor), buffers, urls),
        })
    }
}

impl Default for MnsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockTransport;

    fn test_config() -> MnsConfig {
        MnsConfig::builder()
            .access_key_id("id")
            .access_key_secret("secret")
            .endpoint("http://123.mns.cn-hangzhou.aliyuncs.com")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_config() {
        let result = MnsClientBuilder::new()
            .transport(Arc::new(MockTransport::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_with_config() {
        let client = MnsClientBuilder::new()
            .config(test_config())
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();

        assert_eq!(client.config().credentials.access_key_id(), "id");
        assert_eq!(client.queue("jobs").name(), "jobs");
        assert_eq!(client.topic("events").name(), "events");
    }

    #[test]
    fn test_builder_default_transport() {
        let client = MnsClientBuilder::new().config(test_config()).build();
        assert!(client.is_ok());
    }
}
