//! HTTP transport layer for MNS requests.
//!
//! The transport performs a single HTTP exchange. Signing, retries and
//! deadlines belong to the executor. Connection pooling is delegated to the
//! underlying HTTP client.

use crate::error::{MnsError, NetworkError};
use crate::resilience::TransientFaultKind;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Method};
use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};
use url::Url;

/// Response header carrying the MNS request id.
pub const REQUEST_ID_HEADER: &str = "x-mns-request-id";

/// HTTP request to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Request headers, including `Authorization`.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replace the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Status and headers of a received response. The body is written into the
/// caller's buffer.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the MNS request id from the response headers.
    pub fn request_id(&self) -> Option<&str> {
        self.get_header(REQUEST_ID_HEADER).filter(|id| !id.is_empty())
    }
}

/// HTTP transport trait for making requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request`, writing the full response body into `body`.
    ///
    /// Failures that look like a peer closing an idle connection must be
    /// reported as [`NetworkError::Transient`] with the matching tag.
    async fn send(&self, request: HttpRequest, body: &mut BytesMut)
        -> Result<HttpResponse, MnsError>;
}

/// Default HTTP transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, MnsError> {
        Self::builder().build()
    }

    /// Create a transport builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
        body: &mut BytesMut,
    ) -> Result<HttpResponse, MnsError> {
        let started = Instant::now();

        let mut req_builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(payload) = request.body {
            req_builder = req_builder.body(payload);
        }

        let mut response = req_builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, started))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(e, started))?
        {
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse { status, headers })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

/// Find a transient fault tag anywhere in an error's source chain.
///
/// I/O errors are matched on their kind. An HTTP exchange that ended before a
/// complete response arrived counts as an unexpected end of stream.
pub fn transient_fault(err: &(dyn StdError + 'static)) -> Option<TransientFaultKind> {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if let Some(kind) = TransientFaultKind::from_io_kind(io_err.kind()) {
                return Some(kind);
            }
        }
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return Some(TransientFaultKind::UnexpectedEof);
            }
        }
        source = e.source();
    }
    None
}

fn map_reqwest_error(e: reqwest::Error, started: Instant) -> MnsError {
    if e.is_timeout() {
        return NetworkError::Timeout {
            duration: started.elapsed(),
        }
        .into();
    }
    if let Some(kind) = transient_fault(&e) {
        return NetworkError::Transient {
            kind,
            message: e.to_string(),
        }
        .into();
    }
    NetworkError::ConnectionFailed {
        message: e.to_string(),
    }
    .into()
}

/// Builder for reqwest transport.
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    timeout: Option<Duration>,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    user_agent: String,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: None,
            pool_max_idle_per_host: 100,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            user_agent: format!("aliyun-mns-integration/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a client-wide timeout. Per-call deadlines are applied by the
    /// executor regardless.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the idle connection timeout.
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport, MnsError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(self.pool_idle_timeout)
            .user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            MnsError::Network(NetworkError::TlsError {
                message: e.to_string(),
            })
        })?;

        Ok(ReqwestTransport { client })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
