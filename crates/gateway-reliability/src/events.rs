//! Events emitted by a [`crate::ReliabilityGate`] for observability.

use crate::GateState;
use gateway_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// An observable event emitted during a gate's lifetime.
#[derive(Debug, Clone)]
pub enum GateEvent {
    /// The gate transitioned from one state to another.
    StateTransition {
        backend_id: String,
        timestamp: Instant,
        from_state: GateState,
        to_state: GateState,
    },
    /// A call was admitted to the guarded backend.
    CallPermitted {
        backend_id: String,
        timestamp: Instant,
        state: GateState,
    },
    /// A call was rejected by the gate without reaching the backend.
    CallRejected {
        backend_id: String,
        timestamp: Instant,
        state: GateState,
    },
    /// A call to the backend completed successfully.
    SuccessRecorded {
        backend_id: String,
        timestamp: Instant,
        state: GateState,
        duration: Duration,
    },
    /// A call to the backend failed (including timeout).
    FailureRecorded {
        backend_id: String,
        timestamp: Instant,
        state: GateState,
        duration: Duration,
        retryable: bool,
    },
    /// A fallback was invoked in place of a live backend call.
    FallbackInvoked {
        backend_id: String,
        timestamp: Instant,
        state: GateState,
    },
}

impl ResilienceEvent for GateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GateEvent::StateTransition { .. } => "state_transition",
            GateEvent::CallPermitted { .. } => "call_permitted",
            GateEvent::CallRejected { .. } => "call_rejected",
            GateEvent::SuccessRecorded { .. } => "success_recorded",
            GateEvent::FailureRecorded { .. } => "failure_recorded",
            GateEvent::FallbackInvoked { .. } => "fallback_invoked",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            GateEvent::StateTransition { timestamp, .. }
            | GateEvent::CallPermitted { timestamp, .. }
            | GateEvent::CallRejected { timestamp, .. }
            | GateEvent::SuccessRecorded { timestamp, .. }
            | GateEvent::FailureRecorded { timestamp, .. }
            | GateEvent::FallbackInvoked { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            GateEvent::StateTransition { backend_id, .. }
            | GateEvent::CallPermitted { backend_id, .. }
            | GateEvent::CallRejected { backend_id, .. }
            | GateEvent::SuccessRecorded { backend_id, .. }
            | GateEvent::FailureRecorded { backend_id, .. }
            | GateEvent::FallbackInvoked { backend_id, .. } => backend_id,
        }
    }
}
