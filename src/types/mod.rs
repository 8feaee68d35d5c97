//! Request and response types for MNS operations.

mod queue;
mod topic;

pub use queue::*;
pub use topic::*;

use chrono::{DateTime, TimeZone, Utc};
use std::ops::Deref;

/// Convert an MNS timestamp (milliseconds since the Unix epoch).
///
/// Returns `None` for values outside the representable range.
pub fn time_from_unix_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Result of an operation together with its request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnsResponse<T> {
    /// Value of the `x-mns-request-id` response header.
    pub request_id: Option<String>,
    /// Operation result.
    pub value: T,
}

impl<T> MnsResponse<T> {
    /// Create a new response.
    pub fn new(request_id: Option<String>, value: T) -> Self {
        Self { request_id, value }
    }

    /// Discard the request id.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Transform the value, keeping the request id.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MnsResponse<U> {
        MnsResponse {
            request_id: self.request_id,
            value: f(self.value),
        }
    }
}

impl<T> Deref for MnsResponse<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}
