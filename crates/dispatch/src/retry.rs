//! Failure classification and the retry decision.
//!
//! Transient errors (transport hiccups, lookup timeouts) are worth retrying
//! up to a ceiling; permanent errors (unknown recipient, unrenderable
//! payload) can never succeed and go straight to the dead-letter state.

use thiserror::Error;
use uuid::Uuid;

use courier_render::RenderError;

/// Everything that can go wrong while processing a single record or bucket.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unrecognized kind or structurally invalid payload. Permanent.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// The recipient does not exist. Permanent.
    #[error("recipient {0} not found")]
    RecipientNotFound(Uuid),

    /// The recipient exists but has no email address. Permanent.
    #[error("recipient {0} has no email address")]
    NoAddress(Uuid),

    /// The transport rejected the message outright (4xx). Permanent.
    #[error("delivery rejected: {0}")]
    DeliveryRejected(String),

    /// Network/timeout/rate-limit failure from the transport. Transient.
    #[error("delivery failed: {0}")]
    DeliveryTransient(String),

    /// The recipient lookup itself failed (store error). Transient.
    #[error("recipient lookup failed: {0}")]
    ResolveTransient(String),
}

impl DispatchError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DispatchError::DeliveryTransient(_) | DispatchError::ResolveTransient(_)
        )
    }
}

/// Decides terminal vs. requeue-eligible on failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: i32,
}

impl RetryPolicy {
    pub fn new(max_retries: i32) -> Self {
        Self { max_retries }
    }

    /// Returns `true` if the record should re-enter the pending pool.
    ///
    /// `retry_count` is the record's current (pre-increment) count:
    /// transient failures requeue while it is below the ceiling, permanent
    /// failures never requeue regardless of count.
    pub fn should_retry(&self, retry_count: i32, error: &DispatchError) -> bool {
        error.is_transient() && retry_count < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_retries_below_ceiling() {
        let policy = RetryPolicy::new(5);
        let err = DispatchError::DeliveryTransient("connection reset".to_string());
        assert!(policy.should_retry(0, &err));
        assert!(policy.should_retry(4, &err));
        assert!(!policy.should_retry(5, &err));
        assert!(!policy.should_retry(6, &err));
    }

    #[test]
    fn test_permanent_never_retries() {
        let policy = RetryPolicy::new(5);
        let err = DispatchError::RecipientNotFound(Uuid::new_v4());
        assert!(!policy.should_retry(0, &err));

        let err = DispatchError::DeliveryRejected("invalid address".to_string());
        assert!(!policy.should_retry(0, &err));
    }

    #[test]
    fn test_resolve_timeout_is_transient() {
        let err = DispatchError::ResolveTransient("pool timed out".to_string());
        assert!(err.is_transient());
    }
}
