//! Mock HTTP transport for testing.

use crate::error::{MnsError, NetworkError};
use crate::resilience::TransientFaultKind;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, REQUEST_ID_HEADER};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
    /// Time to wait before responding.
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// Create a response with the given status and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            delay: None,
        }
    }

    /// Create a successful response with empty body.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Create a successful response with body.
    pub fn ok_with_body(body: impl Into<Bytes>) -> Self {
        Self::new(200).with_body(body)
    }

    /// Create a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Create an error response.
    pub fn error(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status).with_body(body)
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header to the response.
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    /// Set the `x-mns-request-id` header.
    pub fn with_request_id(self, request_id: &'static str) -> Self {
        self.with_header(REQUEST_ID_HEADER, request_id)
    }

    /// Wait before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A scripted transport outcome.
#[derive(Debug)]
pub enum MockOutcome {
    /// Respond with the given response.
    Respond(MockResponse),
    /// Fail with the given error.
    Fail(MnsError),
}

/// Mock HTTP transport for testing.
///
/// Outcomes are consumed in order. When none remain, the default response is
/// used if set, otherwise the call fails with a connection error.
pub struct MockTransport {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Option<MockResponse>,
}

impl MockTransport {
    /// Create a new mock transport with no outcomes.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: None,
        }
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        let transport = Self::new();
        for response in responses {
            transport.queue_response(response);
        }
        transport
    }

    /// Create a mock transport with a default response.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::new()
        }
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: MockResponse) {
        self.outcomes.lock().push_back(MockOutcome::Respond(response));
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: MnsError) {
        self.outcomes.lock().push_back(MockOutcome::Fail(error));
    }

    /// Queue a transient connection fault.
    pub fn queue_transient(&self, kind: TransientFaultKind) {
        self.queue_error(transient_error(kind));
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of outcomes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the error a transport reports for `kind`.
pub fn transient_error(kind: TransientFaultKind) -> MnsError {
    MnsError::Network(NetworkError::Transient {
        kind,
        message: format!("mock {}", kind),
    })
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(
        &self,
        request: HttpRequest,
        body: &mut BytesMut,
    ) -> Result<HttpResponse, MnsError> {
        self.requests.lock().push(request);

        let outcome = self.outcomes.lock().pop_front();
        let response = match outcome {
            Some(MockOutcome::Respond(response)) => response,
            Some(MockOutcome::Fail(error)) => return Err(error),
            None => match &self.default_response {
                Some(response) => response.clone(),
                None => {
                    return Err(MnsError::Network(NetworkError::ConnectionFailed {
                        message: "no mock response queued".to_string(),
                    }))
                }
            },
        };

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        body.extend_from_slice(&response.body);
        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
        })
    }
}
