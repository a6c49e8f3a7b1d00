//! [`ReliabilityGate`]: the per-backend circuit breaker guarding outbound calls.

use crate::config::GateConfig;
use crate::error::GateError;
use crate::events::GateEvent;
use crate::state::{BackendOutcomeRecord, ErrorRecord, GateMachine, GateState};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A boxed, type-erased async backend call. Both the live invocation and an
/// optional fallback passed to [`ReliabilityGate::call`] take this shape so
/// the gate never needs to know anything about the underlying transport.
pub type BackendCall<'a, T, E> = BoxFuture<'a, Result<T, E>>;

/// A point-in-time snapshot of a gate's counters, useful for dashboards and
/// tests without holding the internal lock.
#[derive(Debug, Clone)]
pub struct GateMetrics {
    pub backend_id: String,
    pub state: GateState,
    pub total_calls: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub success_rate: f64,
    pub failure_count: u32,
    pub consecutive_successes: u32,
    pub half_open_attempts: u32,
    pub time_in_state: Duration,
    pub mean_latency: Duration,
    pub recent_errors: Vec<ErrorRecord>,
}

/// Guards calls to a single backend with a four-state circuit breaker:
/// CLOSED → OPEN → HALF_OPEN → CLOSED on recovery, or OPEN/HALF_OPEN →
/// DECONSTRUCTED after the accumulated failure count reaches
/// `deconstruct_threshold`.
///
/// Cloning a `ReliabilityGate` is cheap and shares the same underlying
/// state (it is `Arc`-backed internally), mirroring how callers typically
/// hand gates out to concurrent tasks.
pub struct ReliabilityGate<E> {
    backend_id: String,
    config: GateConfig<E>,
    inner: Arc<Mutex<GateMachine>>,
    state_mirror: Arc<AtomicU8>,
    events: Arc<gateway_core::events::EventListeners<GateEvent>>,
}

impl<E> Clone for ReliabilityGate<E> {
    fn clone(&self) -> Self {
        Self {
            backend_id: self.backend_id.clone(),
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
            state_mirror: Arc::clone(&self.state_mirror),
            events: Arc::clone(&self.events),
        }
    }
}

impl<E> ReliabilityGate<E>
where
    E: std::fmt::Display + Send + 'static,
{
    /// Creates a new gate for `backend_id` with the given configuration.
    pub fn new(backend_id: impl Into<String>, config: GateConfig<E>) -> Self {
        let events = Arc::new(config.listeners.clone());
        Self {
            backend_id: backend_id.into(),
            config,
            inner: Arc::new(Mutex::new(GateMachine::new())),
            state_mirror: Arc::new(AtomicU8::new(GateState::Closed.as_u8())),
            events,
        }
    }

    /// The backend identifier this gate guards.
    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }

    /// Lock-free read of the current state, safe to call from hot paths that
    /// only need an approximate, eventually-consistent view (e.g. a scoring
    /// loop deciding which backends to consider).
    pub fn state_sync(&self) -> GateState {
        GateState::from_u8(self.state_mirror.load(Ordering::Acquire))
    }

    /// True iff `state ∈ {CLOSED, HALF_OPEN, DECONSTRUCTED}` — OPEN is the
    /// only state unavailable from the caller's perspective. Does not itself
    /// admit a call; racy against concurrent calls by design.
    pub fn is_available(&self) -> bool {
        match self.state_sync() {
            GateState::Closed | GateState::HalfOpen | GateState::Deconstructed => true,
            GateState::Open => false,
        }
    }

    /// Returns a snapshot of the gate's counters and recent error history.
    pub fn metrics(&self) -> GateMetrics {
        let inner = self.inner.lock().unwrap();
        GateMetrics {
            backend_id: self.backend_id.clone(),
            state: inner.state,
            total_calls: inner.total_calls,
            total_successes: inner.total_successes,
            total_failures: inner.total_failures,
            success_rate: inner.lifetime_success_rate(),
            failure_count: inner.failure_count,
            consecutive_successes: inner.consecutive_successes,
            half_open_attempts: inner.half_open_attempts,
            time_in_state: inner.state_entered_at.elapsed(),
            mean_latency: inner.mean_latency(),
            recent_errors: inner.errors.iter().cloned().collect(),
        }
    }

    /// Returns recorded call outcomes, most recent last, for use by upstream
    /// scoring (e.g. a `SemanticOrchestrator` computing a server score).
    pub fn outcome_history(&self) -> Vec<BackendOutcomeRecord> {
        self.inner.lock().unwrap().outcomes.iter().cloned().collect()
    }

    /// Forces the gate back to CLOSED and clears its counters, including out
    /// of the terminal DECONSTRUCTED state. Intended for operator-driven
    /// recovery, not automatic retry logic.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        let from = inner.state;
        let mut fresh = GateMachine::new();
        fresh.enter(GateState::Closed);
        *inner = fresh;
        self.state_mirror.store(GateState::Closed.as_u8(), Ordering::Release);
        drop(inner);
        if from != GateState::Closed {
            self.emit_transition(from, GateState::Closed);
        }
    }

    /// Runs `invoke` if the gate admits the call, recording the outcome and
    /// driving the state machine. If the gate rejects the call and
    /// `fallback` is provided, it is run instead (and does not affect the
    /// gate's counters, mirroring how a bypassed call carries no signal
    /// about the backend's health — fallbacks never probe backend health).
    pub async fn call<'a, T>(
        &'a self,
        invoke: BackendCall<'a, T, E>,
        fallback: Option<BackendCall<'a, T, E>>,
    ) -> Result<T, GateError<E>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.total_calls += 1;
        }
        #[cfg(feature = "metrics")]
        counter!("gate_calls_total", "backend" => self.backend_id.clone()).increment(1);

        match self.admit() {
            Ok(()) => {}
            Err(rejection) => {
                self.emit(GateEvent::CallRejected {
                    backend_id: self.backend_id.clone(),
                    timestamp: Instant::now(),
                    state: self.state_sync(),
                });
                #[cfg(feature = "tracing")]
                tracing::debug!(backend = %self.backend_id, state = %self.state_sync(), "call rejected by gate");

                if let Some(fallback) = fallback {
                    self.emit(GateEvent::FallbackInvoked {
                        backend_id: self.backend_id.clone(),
                        timestamp: Instant::now(),
                        state: self.state_sync(),
                    });
                    return fallback.await.map_err(GateError::Inner);
                }
                return Err(rejection);
            }
        }

        self.emit(GateEvent::CallPermitted {
            backend_id: self.backend_id.clone(),
            timestamp: Instant::now(),
            state: self.state_sync(),
        });

        let started = Instant::now();
        let outcome = match self.config.call_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, invoke).await {
                Ok(result) => result,
                Err(_) => {
                    let elapsed = started.elapsed();
                    self.on_failure_raw(
                        format!("call to `{}` timed out after {:?}", self.backend_id, elapsed),
                        elapsed,
                        true,
                    );
                    return Err(GateError::Timeout {
                        backend_id: self.backend_id.clone(),
                        elapsed,
                    });
                }
            },
            None => invoke.await,
        };

        let elapsed = started.elapsed();
        match outcome {
            Ok(value) => {
                self.on_success(elapsed);
                Ok(value)
            }
            Err(err) => {
                // Retryability is recorded for observability only — per the
                // gate's error taxonomy, classification never itself alters
                // state transitions, so every failure (including
                // programming-class ones) is applied the same way.
                let retryable = (self.config.classifier)(&err);
                self.on_failure_raw(err.to_string(), elapsed, retryable);
                Err(GateError::Inner(err))
            }
        }
    }

    /// Checks admission and, if transitioning OPEN→HALF_OPEN or already
    /// HALF_OPEN, reserves a probe slot. Returns a rejection error
    /// describing why the call was not admitted.
    fn admit(&self) -> Result<(), GateError<E>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            GateState::Closed => Ok(()),
            GateState::Deconstructed => Err(GateError::ServiceDegraded {
                backend_id: self.backend_id.clone(),
                fallback_available: false,
            }),
            GateState::Open => {
                let backoff = GateMachine::backoff(self.config.reset_timeout, inner.half_open_attempts);
                let elapsed = inner.state_entered_at.elapsed();
                if elapsed >= backoff {
                    inner.enter(GateState::HalfOpen);
                    inner.half_open_attempts += 1;
                    inner.half_open_inflight = 1;
                    let from = GateState::Open;
                    drop(inner);
                    self.state_mirror.store(GateState::HalfOpen.as_u8(), Ordering::Release);
                    self.emit_transition(from, GateState::HalfOpen);
                    Ok(())
                } else {
                    let retry_after = backoff.saturating_sub(elapsed);
                    Err(GateError::CircuitOpen {
                        backend_id: self.backend_id.clone(),
                        retry_after,
                    })
                }
            }
            GateState::HalfOpen => {
                if inner.half_open_inflight < self.config.half_open_limit {
                    inner.half_open_inflight += 1;
                    Ok(())
                } else {
                    Err(GateError::ServiceDegraded {
                        backend_id: self.backend_id.clone(),
                        fallback_available: false,
                    })
                }
            }
        }
    }

    fn on_success(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.push_outcome(true, latency);
        inner.total_successes += 1;
        inner.last_success_at = Some(Instant::now());
        inner.consecutive_successes += 1;

        match inner.state {
            GateState::Closed => {
                inner.failure_count = 0;
            }
            GateState::HalfOpen => {
                inner.success_count_in_half_open += 1;
                if inner.success_count_in_half_open >= self.config.success_threshold {
                    let from = inner.state;
                    inner.enter(GateState::Closed);
                    drop(inner);
                    self.state_mirror.store(GateState::Closed.as_u8(), Ordering::Release);
                    self.emit_transition(from, GateState::Closed);
                    return;
                }
            }
            GateState::Deconstructed => {
                let recovery_threshold = self
                    .config
                    .success_threshold
                    .saturating_mul(self.config.deconstruction_recovery_factor);
                if inner.consecutive_successes >= recovery_threshold {
                    let from = inner.state;
                    inner.enter(GateState::HalfOpen);
                    drop(inner);
                    self.state_mirror.store(GateState::HalfOpen.as_u8(), Ordering::Release);
                    self.emit_transition(from, GateState::HalfOpen);
                    return;
                }
            }
            GateState::Open => {}
        }
        drop(inner);

        #[cfg(feature = "metrics")]
        counter!("gate_call_outcomes_total", "backend" => self.backend_id.clone(), "outcome" => "success").increment(1);

        self.emit(GateEvent::SuccessRecorded {
            backend_id: self.backend_id.clone(),
            timestamp: Instant::now(),
            state: self.state_sync(),
            duration: latency,
        });
    }

    fn on_failure_raw(&self, message: String, latency: Duration, retryable: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.push_outcome(false, latency);
        inner.total_failures += 1;
        inner.last_failure_at = Some(Instant::now());
        inner.consecutive_successes = 0;
        let state_at_failure = inner.state;
        inner.push_error(message, state_at_failure, retryable);

        match inner.state {
            GateState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.enter(GateState::Open);
                    drop(inner);
                    self.state_mirror.store(GateState::Open.as_u8(), Ordering::Release);
                    self.emit_transition(GateState::Closed, GateState::Open);
                    self.emit_failure(state_at_failure, latency);
                    return;
                }
            }
            GateState::HalfOpen => {
                // `failure_count` is never reset on entering HALF_OPEN (see
                // `GateMachine::enter`), so it keeps tallying failed recovery
                // attempts across OPEN/HALF_OPEN cycles until it either
                // recovers to CLOSED or crosses `deconstruct_threshold`.
                inner.failure_count += 1;
                if inner.failure_count >= self.config.deconstruct_threshold {
                    inner.enter(GateState::Deconstructed);
                    drop(inner);
                    self.state_mirror.store(GateState::Deconstructed.as_u8(), Ordering::Release);
                    self.emit_transition(GateState::HalfOpen, GateState::Deconstructed);
                    self.emit_failure(state_at_failure, latency);
                    return;
                }
                inner.enter(GateState::Open);
                drop(inner);
                self.state_mirror.store(GateState::Open.as_u8(), Ordering::Release);
                self.emit_transition(GateState::HalfOpen, GateState::Open);
                self.emit_failure(state_at_failure, latency);
                return;
            }
            GateState::Open | GateState::Deconstructed => {}
        }
        drop(inner);
        self.emit_failure(state_at_failure, latency);
    }

    fn emit_failure(&self, state: GateState, latency: Duration) {
        #[cfg(feature = "metrics")]
        counter!("gate_call_outcomes_total", "backend" => self.backend_id.clone(), "outcome" => "failure").increment(1);

        self.emit(GateEvent::FailureRecorded {
            backend_id: self.backend_id.clone(),
            timestamp: Instant::now(),
            state,
            duration: latency,
            retryable: true,
        });
    }

    fn emit_transition(&self, from: GateState, to: GateState) {
        #[cfg(feature = "tracing")]
        tracing::info!(backend = %self.backend_id, from = %from, to = %to, "gate state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "gate_transitions_total",
                "backend" => self.backend_id.clone(),
                "from" => from.to_string(),
                "to" => to.to_string()
            )
            .increment(1);
            gauge!("gate_state", "backend" => self.backend_id.clone()).set(to.as_u8() as f64);
        }

        self.emit(GateEvent::StateTransition {
            backend_id: self.backend_id.clone(),
            timestamp: Instant::now(),
            from_state: from,
            to_state: to,
        });
    }

    fn emit(&self, event: GateEvent) {
        self.events.emit(&event);
    }
}
