//! Configuration for a [`crate::ReliabilityGate`].

use crate::events::GateEvent;
use gateway_core::events::{EventListeners, FnListener};
use std::sync::Arc;
use std::time::Duration;

/// Classifies a backend error as retryable (counts toward the failure
/// threshold) or non-retryable (a programming/validation error that should
/// propagate without tripping the gate).
pub type ErrorClassifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Tunables for a single backend's [`crate::ReliabilityGate`].
///
/// Construct via [`GateConfig::builder`], or start from one of the presets
/// ([`GateConfig::standard`], [`GateConfig::fast_fail`], [`GateConfig::tolerant`]).
pub struct GateConfig<E> {
    /// Monotone failures before tripping CLOSED to OPEN. Default 5.
    pub failure_threshold: u32,
    /// Consecutive successes in HALF_OPEN before returning to CLOSED. Default 2.
    pub success_threshold: u32,
    /// Base duration the gate stays OPEN before admitting a HALF_OPEN probe.
    /// Default 60s.
    pub reset_timeout: Duration,
    /// Max probes admitted per HALF_OPEN window before further calls are
    /// rejected with [`crate::GateError::ServiceDegraded`]. Default 3.
    pub half_open_limit: u32,
    /// Monotone failure count after which the gate is retired to
    /// DECONSTRUCTED instead of cycling back to OPEN. Default 10.
    pub deconstruct_threshold: u32,
    /// Multiplier applied to `success_threshold` to derive the consecutive
    /// successes required for DECONSTRUCTED to recover to HALF_OPEN. Default 2.
    pub deconstruction_recovery_factor: u32,
    /// Per-call timeout. `None` disables timeout enforcement. Default 30s.
    pub call_timeout: Option<Duration>,
    pub(crate) classifier: ErrorClassifier<E>,
    pub(crate) listeners: EventListeners<GateEvent>,
}

impl<E> Clone for GateConfig<E> {
    fn clone(&self) -> Self {
        Self {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            reset_timeout: self.reset_timeout,
            half_open_limit: self.half_open_limit,
            deconstruct_threshold: self.deconstruct_threshold,
            deconstruction_recovery_factor: self.deconstruction_recovery_factor,
            call_timeout: self.call_timeout,
            classifier: Arc::clone(&self.classifier),
            listeners: self.listeners.clone(),
        }
    }
}

impl<E> GateConfig<E> {
    /// Starts a [`GateConfigBuilder`] seeded with library defaults.
    pub fn builder() -> GateConfigBuilder<E> {
        GateConfigBuilder::new()
    }

    /// Balanced defaults: five failures to trip, three successes to close,
    /// thirty second base backoff.
    pub fn standard() -> Self {
        Self::builder().build()
    }

    /// Trips aggressively and recovers cautiously; suited to latency-critical
    /// backends where a slow failure is worse than a false trip.
    pub fn fast_fail() -> Self {
        Self::builder()
            .failure_threshold(2)
            .success_threshold(3)
            .reset_timeout(Duration::from_secs(60))
            .half_open_limit(1)
            .build()
    }

    /// Tolerates more failures before tripping and recovers eagerly; suited
    /// to flaky but non-critical backends.
    pub fn tolerant() -> Self {
        Self::builder()
            .failure_threshold(10)
            .success_threshold(2)
            .reset_timeout(Duration::from_secs(10))
            .half_open_limit(5)
            .build()
    }
}

/// Builder for [`GateConfig`].
pub struct GateConfigBuilder<E> {
    failure_threshold: u32,
    success_threshold: u32,
    reset_timeout: Duration,
    half_open_limit: u32,
    deconstruct_threshold: u32,
    deconstruction_recovery_factor: u32,
    call_timeout: Option<Duration>,
    classifier: ErrorClassifier<E>,
    listeners: EventListeners<GateEvent>,
}

impl<E> GateConfigBuilder<E> {
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(60),
            half_open_limit: 3,
            deconstruct_threshold: 10,
            deconstruction_recovery_factor: 2,
            call_timeout: Some(Duration::from_secs(30)),
            classifier: Arc::new(|_| true),
            listeners: EventListeners::new(),
        }
    }

    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    pub fn success_threshold(mut self, n: u32) -> Self {
        self.success_threshold = n;
        self
    }

    /// Sets the multiplier applied to `success_threshold` for the
    /// DECONSTRUCTED → HALF_OPEN consecutive-successes recovery check.
    pub fn deconstruction_recovery_factor(mut self, n: u32) -> Self {
        self.deconstruction_recovery_factor = n;
        self
    }

    pub fn reset_timeout(mut self, d: Duration) -> Self {
        self.reset_timeout = d;
        self
    }

    pub fn half_open_limit(mut self, n: u32) -> Self {
        self.half_open_limit = n;
        self
    }

    pub fn deconstruct_threshold(mut self, n: u32) -> Self {
        self.deconstruct_threshold = n;
        self
    }

    pub fn call_timeout(mut self, d: Duration) -> Self {
        self.call_timeout = Some(d);
        self
    }

    /// Sets the closure used to classify backend errors as retryable.
    /// Non-retryable errors propagate through the gate without affecting
    /// its failure count. Defaults to treating every error as retryable.
    pub fn classify_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.classifier = Arc::new(f);
        self
    }

    /// Registers a listener invoked on every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(&GateEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Registers a listener invoked on every emitted [`GateEvent`],
    /// regardless of variant.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&GateEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    pub fn build(self) -> GateConfig<E> {
        GateConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            reset_timeout: self.reset_timeout,
            half_open_limit: self.half_open_limit,
            deconstruct_threshold: self.deconstruct_threshold,
            deconstruction_recovery_factor: self.deconstruction_recovery_factor,
            call_timeout: self.call_timeout,
            classifier: self.classifier,
            listeners: self.listeners,
        }
    }
}

impl<E> Default for GateConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Default for GateConfig<E> {
    fn default() -> Self {
        Self::standard()
    }
}
