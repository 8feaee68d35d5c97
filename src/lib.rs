//! Alibaba Cloud Message Service (MNS) Integration Module
//!
//! Signed request pipeline and typed client for MNS queues and topics.
//!
//! # Features
//!
//! - **Signing**: MNS HMAC-SHA1 request authentication
//! - **Integrity**: `MessageBodyMD5` verification and optional base64 transport
//! - **Resilience**: Retry of idle-connection faults with a pluggable classifier
//! - **Deadlines**: Per-attempt timeout and per-call deadlines
//! - **Pooling**: Reusable request and response buffers and cached URL parsing
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aliyun_mns::SendMessageRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aliyun_mns::MnsError> {
//!     // Create client from environment
//!     let client = aliyun_mns::create_client_from_env()?;
//!     let queue = client.queue("jobs");
//!
//!     let sent = queue.send_message(SendMessageRequest::new("hello, mns")).await?;
//!     println!("Sent message {}", sent.message_id);
//!
//!     let received = queue.receive_message(10).await?;
//!     queue.delete_message(&received.receipt_handle).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod mocks;
pub mod pool;
pub mod resilience;
pub mod services;
pub mod signing;
pub mod transport;
pub mod types;
pub mod url_cache;
pub mod xml;

// Re-export main types at crate root
pub use client::{MnsClient, MnsClientBuilder};
pub use config::{MnsConfig, MnsConfigBuilder};
pub use credentials::MnsCredentials;
pub use error::{
    ConfigurationError, ErrorCategory, IntegrityError, MnsError, NetworkError, RequestError,
    ResponseError, ServiceError,
};
pub use executor::{CallContext, RawResponse, RequestExecutor};
pub use pool::BufferPool;
pub use resilience::{RetryConfig, RetryPolicy, TransientFaultKind};
pub use services::{QueueService, ServiceContext, TopicService};
pub use signing::{MnsSigner, RequestSigner};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    // Request types
    PublishMessageRequest,
    SendMessageRequest,
    // Response types
    BatchDeleteMessageErrorItem,
    BatchSendMessageResultItem,
    ChangeMessageVisibilityResponse,
    Message,
    MnsResponse,
    PeekedMessage,
    PublishMessageResponse,
    SendMessageResponse,
};
pub use url_cache::UrlCache;

/// Create a new MNS client from environment variables.
///
/// This will read configuration from:
/// - `MNS_ACCESS_KEY_ID` and `MNS_ACCESS_KEY_SECRET` for credentials
/// - `MNS_ENDPOINT` for the account endpoint
/// - `MNS_TIMEOUT_MS`, `MNS_BASE64_ENABLED` and `MNS_MAX_ATTEMPTS` for tuning
///
/// # Example
///
/// ```rust,no_run
/// let client = aliyun_mns::create_client_from_env()?;
/// # Ok::<(), aliyun_mns::MnsError>(())
/// ```
pub fn create_client_from_env() -> Result<MnsClient> {
    MnsClientBuilder::new().from_env().build()
}

/// Create a new MNS client with explicit configuration.
///
/// # Example
///
/// ```rust,no_run
/// use aliyun_mns::MnsConfig;
///
/// let config = MnsConfig::builder()
///     .access_key_id("LTAI...")
///     .access_key_secret("secret")
///     .endpoint("https://123456.mns.cn-hangzhou.aliyuncs.com")
///     .build()?;
///
/// let client = aliyun_mns::create_client(config)?;
/// # Ok::<(), aliyun_mns::MnsError>(())
/// ```
pub fn create_client(config: MnsConfig) -> Result<MnsClient> {
    MnsClientBuilder::new().config(config).build()
}

/// Result type alias for MNS operations.
pub type Result<T> = std::result::Result<T, MnsError>;
