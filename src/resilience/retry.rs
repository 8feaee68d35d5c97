//! Retry policy for transient connection faults.

use crate::error::MnsError;
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Connection-level fault tags produced by the transport.
///
/// These describe failures where the server most likely closed an idle
/// keep-alive connection before the request was processed. Recognizing them
/// is a best-effort heuristic over the networking stack's error shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientFaultKind {
    /// The peer reset the connection.
    ConnectionReset,
    /// The connection closed before a complete response was received.
    UnexpectedEof,
    /// The connection was aborted locally.
    ConnectionAborted,
    /// Writing to a connection the peer already closed.
    BrokenPipe,
}

impl TransientFaultKind {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransientFaultKind::ConnectionReset => "connection_reset",
            TransientFaultKind::UnexpectedEof => "unexpected_eof",
            TransientFaultKind::ConnectionAborted => "connection_aborted",
            TransientFaultKind::BrokenPipe => "broken_pipe",
        }
    }

    /// Map an I/O error kind to a fault tag.
    pub fn from_io_kind(kind: io::ErrorKind) -> Option<Self> {
        match kind {
            io::ErrorKind::ConnectionReset => Some(TransientFaultKind::ConnectionReset),
            io::ErrorKind::UnexpectedEof => Some(TransientFaultKind::UnexpectedEof),
            io::ErrorKind::ConnectionAborted => Some(TransientFaultKind::ConnectionAborted),
            io::ErrorKind::BrokenPipe => Some(TransientFaultKind::BrokenPipe),
            _ => None,
        }
    }
}

impl fmt::Display for TransientFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a tagged fault is retried.
pub type FaultClassifier = Arc<dyn Fn(TransientFaultKind) -> bool + Send + Sync>;

/// Default classification: connection resets and unexpected end of stream.
pub fn default_fault_classifier(kind: TransientFaultKind) -> bool {
    matches!(
        kind,
        TransientFaultKind::ConnectionReset | TransientFaultKind::UnexpectedEof
    )
}

/// Retry configuration.
#[derive(Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    classifier: FaultClassifier,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            classifier: Arc::new(default_fault_classifier),
        }
    }
}

impl RetryConfig {
    /// Create a configuration with the given attempt cap and the default classifier.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a configuration that never retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Replace the fault classifier.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(TransientFaultKind) -> bool + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Retry exactly the given fault kinds.
    pub fn retry_on(self, kinds: impl IntoIterator<Item = TransientFaultKind>) -> Self {
        let kinds: HashSet<TransientFaultKind> = kinds.into_iter().collect();
        self.with_classifier(move |kind| kinds.contains(&kind))
    }

    /// Returns true if the classifier accepts `kind`.
    pub fn is_retryable_fault(&self, kind: TransientFaultKind) -> bool {
        (self.classifier)(kind)
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Retry policy applied by the request executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Attempt cap, never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Returns true if `error` carries a fault tag the classifier accepts.
    /// Service errors, timeouts and everything untagged are never retried.
    pub fn should_retry(&self, error: &MnsError) -> bool {
        error
            .fault_kind()
            .map(|kind| self.config.is_retryable_fault(kind))
            .unwrap_or(false)
    }

    /// Get the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
