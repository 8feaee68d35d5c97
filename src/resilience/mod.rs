//! Resilience layer for MNS requests.
//!
//! MNS requests are retried only for a narrow class of connection-level
//! faults, without backoff. The fault class is configurable through
//! [`RetryConfig`].

mod retry;

pub use retry::{default_fault_classifier, FaultClassifier, RetryConfig, RetryPolicy, TransientFaultKind};
