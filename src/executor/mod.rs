//! Signed, retrying execution of MNS HTTP requests.
//!
//! Each attempt rebuilds the header set from the caller's headers, fills in
//! `Date`, `x-mns-version`, `Content-Type` and, when a body is present,
//! `Content-MD5` and `Content-Length`, then signs the final header set. Only
//! failures tagged as transient connection faults are retried, immediately
//! and up to the configured attempt cap.

use crate::codec::content_md5;
use crate::error::{decode_error_response, MnsError, NetworkError, RequestError};
use crate::resilience::RetryPolicy;
use crate::signing::{
    canonicalized_resource, format_date, RequestSigner, CONTENT_TYPE_XML, MNS_VERSION,
    MNS_VERSION_HEADER,
};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

const CONTENT_MD5: &str = "content-md5";

/// Per-call deadline settings.
///
/// Dropping the future returned by an operation cancels it, including any
/// remaining attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    min_timeout: Option<Duration>,
}

impl CallContext {
    /// A context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop issuing attempts at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Raise the configured per-attempt timeout to at least `min_timeout`.
    /// Has no effect when no timeout is configured.
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = Some(min_timeout);
        self
    }

    /// The caller's deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The deadline for an attempt starting at `now`: the earlier of the
    /// caller's deadline and `now` plus the configured timeout.
    pub fn effective_deadline(
        &self,
        configured_timeout: Option<Duration>,
        now: Instant,
    ) -> Option<Instant> {
        let timeout = configured_timeout.map(|t| match self.min_timeout {
            Some(min) => t.max(min),
            None => t,
        });
        let from_timeout = timeout.map(|t| now + t);

        match (self.deadline, from_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Outcome of an HTTP exchange. The body borrows the caller's buffer.
#[derive(Debug)]
pub struct RawResponse<'b> {
    /// Value of the `x-mns-request-id` response header.
    pub request_id: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: &'b [u8],
}

impl RawResponse<'_> {
    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode this response as an MNS error.
    pub fn to_error(&self) -> MnsError {
        decode_error_response(self.request_id.as_deref(), self.status, self.body)
    }
}

/// Executes signed requests with bounded retry on transient faults.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn RequestSigner>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl RequestExecutor {
    /// Create an executor with no timeout and the default retry policy.
    pub fn new(transport: Arc<dyn HttpTransport>, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            transport,
            signer,
            timeout: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the per-attempt timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute a signed request, writing the response body into
    /// `response_buffer`.
    ///
    /// Any HTTP status is returned as `Ok`; use [`RawResponse::is_success`]
    /// and [`RawResponse::to_error`] to classify it.
    pub async fn execute<'b>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        response_buffer: &'b mut BytesMut,
    ) -> Result<RawResponse<'b>, MnsError> {
        let body = body.filter(|b| !b.is_empty()).map(Bytes::copy_from_slice);
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0u32;

        let response = loop {
            attempt += 1;
            response_buffer.clear();

            let result = self
                .attempt(ctx, &method, url, headers, body.clone(), response_buffer)
                .await;

            match result {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(attempt = attempt, "MNS request succeeded after retry");
                    }
                    break response;
                }
                Err(error) => {
                    let fault_kind = error.fault_kind().map(|k| k.as_str()).unwrap_or("none");

                    if attempt < max_attempts && self.retry.should_retry(&error) {
                        debug!(
                            attempt = attempt,
                            max_attempts = max_attempts,
                            fault_kind = fault_kind,
                            error = %error,
                            "Retrying MNS request after transient fault"
                        );
                        continue;
                    }

                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error_kind = error.kind_label(),
                        fault_kind = fault_kind,
                        error = %error,
                        method = %method,
                        path = url.path(),
                        "MNS request failed"
                    );
                    return Err(error);
                }
            }
        };

        let request_id = response.request_id().map(String::from);
        let response_buffer: &'b BytesMut = response_buffer;
        Ok(RawResponse {
            request_id,
            status: response.status,
            body: &response_buffer[..],
        })
    }

    async fn attempt(
        &self,
        ctx: &CallContext,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Bytes>,
        response_buffer: &mut BytesMut,
    ) -> Result<HttpResponse, MnsError> {
        let request = self.prepare_request(method, url, headers, body)?;
        let started = Instant::now();

        let Some(deadline) = ctx.effective_deadline(self.timeout, started) else {
            return self.transport.send(request, response_buffer).await;
        };
        if deadline <= started {
            return Err(NetworkError::Timeout {
                duration: Duration::ZERO,
            }
            .into());
        }

        match tokio::time::timeout_at(deadline, self.transport.send(request, response_buffer))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout {
                duration: started.elapsed(),
            }
            .into()),
        }
    }

    /// Build the signed request for one attempt.
    pub fn prepare_request(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Result<HttpRequest, MnsError> {
        let mut headers = headers.clone();

        if !headers.contains_key(DATE) {
            headers.insert(DATE, header_value("date", &format_date(&Utc::now()))?);
        }
        if !headers.contains_key(MNS_VERSION_HEADER) {
            headers.insert(MNS_VERSION_HEADER, HeaderValue::from_static(MNS_VERSION));
        }
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_XML));
        }
        if let Some(body) = body.as_ref() {
            if !headers.contains_key(CONTENT_MD5) {
                headers.insert(CONTENT_MD5, header_value(CONTENT_MD5, &content_md5(body))?);
            }
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        let authorization =
            self.signer
                .authorization(method, &headers, canonicalized_resource(url));
        headers.insert(
            AUTHORIZATION,
            header_value(AUTHORIZATION.as_str(), &authorization)?,
        );

        Ok(HttpRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, MnsError> {
    HeaderValue::from_str(value).map_err(|e| {
        RequestError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MnsCredentials;
    use crate::mocks::MockTransport;
    use crate::signing::{sign, MnsSigner};

    fn executor() -> RequestExecutor {
        RequestExecutor::new(
            Arc::new(MockTransport::new()),
            Arc::new(MnsSigner::new(MnsCredentials::new("testid", "testsecret"))),
        )
    }

    fn queue_url() -> Url {
        Url::parse("https://123456.mns.cn-hangzhou.aliyuncs.com/queues/q/messages?waitseconds=5")
            .unwrap()
    }

    #[test]
    fn test_prepare_request_fills_headers() {
        let request = executor()
            .prepare_request(
                &Method::POST,
                &queue_url(),
                &HeaderMap::new(),
                Some(Bytes::from_static(b"1234567890")),
            )
            .unwrap();

        let headers = &request.headers;
        assert!(headers.contains_key(DATE));
        assert_eq!(headers.get("x-mns-version").unwrap(), MNS_VERSION);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), CONTENT_TYPE_XML);
        assert_eq!(headers.get("content-md5").unwrap(), "6Afx/PgtEy+bsBjKZzihnw==");
        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "10");

        let mut unsigned = headers.clone();
        unsigned.remove(AUTHORIZATION);
        let expected = format!(
            "MNS testid:{}",
            sign(
                &Method::POST,
                &unsigned,
                "/queues/q/messages?waitseconds=5",
                "testsecret"
            )
        );
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), expected.as_str());
    }

    #[test]
    fn test_prepare_request_without_body() {
        let request = executor()
            .prepare_request(&Method::GET, &queue_url(), &HeaderMap::new(), None)
            .unwrap();
        assert!(!request.headers.contains_key("content-md5"));
        assert!(!request.headers.contains_key(CONTENT_LENGTH));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_prepare_request_keeps_caller_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("Tue, 01 May 2018 15:04:05 GMT"));
        headers.insert("x-mns-custom", HeaderValue::from_static("yes"));

        let request = executor()
            .prepare_request(&Method::GET, &queue_url(), &headers, None)
            .unwrap();
        assert_eq!(
            request.headers.get(DATE).unwrap(),
            "Tue, 01 May 2018 15:04:05 GMT"
        );
        assert_eq!(request.headers.get("x-mns-custom").unwrap(), "yes");
    }

    #[test]
    fn test_effective_deadline() {
        let now = Instant::now();
        let ctx = CallContext::new();
        assert_eq!(ctx.effective_deadline(None, now), None);
        assert_eq!(
            ctx.effective_deadline(Some(Duration::from_secs(5)), now),
            Some(now + Duration::from_secs(5))
        );

        let ctx = CallContext::new().with_min_timeout(Duration::from_secs(40));
        assert_eq!(
            ctx.effective_deadline(Some(Duration::from_secs(5)), now),
            Some(now + Duration::from_secs(40))
        );
        assert_eq!(ctx.effective_deadline(None, now), None);

        let ctx = CallContext::new()
            .with_deadline(now + Duration::from_secs(2))
            .with_min_timeout(Duration::from_secs(40));
        assert_eq!(
            ctx.effective_deadline(Some(Duration::from_secs(5)), now),
            Some(now + Duration::from_secs(2))
        );
        assert_eq!(
            ctx.effective_deadline(None, now),
            Some(now + Duration::from_secs(2))
        );
    }
}
