//! Error type returned by a [`crate::ReliabilityGate`].

use std::time::Duration;
use thiserror::Error;

/// Error produced when a guarded call cannot be completed.
///
/// `E` is the backend's own error type, propagated unchanged in the
/// [`GateError::Inner`] variant.
#[derive(Debug, Error)]
pub enum GateError<E> {
    /// The gate is OPEN (or DECONSTRUCTED) and rejected the call without
    /// reaching the backend.
    #[error("circuit open for backend `{backend_id}`, retry after {retry_after:?}")]
    CircuitOpen {
        backend_id: String,
        retry_after: Duration,
    },

    /// The gate is DECONSTRUCTED (or HALF_OPEN with its probe budget for the
    /// current window already exhausted) and rejected the call without
    /// reaching the backend. `fallback_available` is always `false` when
    /// this variant is actually observed by a caller, since a configured
    /// fallback is run in place of raising it.
    #[error("backend `{backend_id}` is degraded (fallback_available={fallback_available})")]
    ServiceDegraded {
        backend_id: String,
        fallback_available: bool,
    },

    /// The call exceeded the configured timeout.
    #[error("call to backend `{backend_id}` timed out after {elapsed:?}")]
    Timeout {
        backend_id: String,
        elapsed: Duration,
    },

    /// The backend call ran and returned an error.
    #[error("backend call failed: {0}")]
    Inner(#[source] E),
}

impl<E> GateError<E> {
    /// Returns the inner backend error, if this is an [`GateError::Inner`].
    pub fn into_inner(self) -> Option<E> {
        match self {
            GateError::Inner(e) => Some(e),
            _ => None,
        }
    }

    /// True if the gate itself rejected the call (no backend error exists).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GateError::Inner(_))
    }
}
