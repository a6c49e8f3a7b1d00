//! Internal state machine backing a [`crate::ReliabilityGate`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum number of error records retained per gate.
const ERROR_HISTORY_CAP: usize = 100;

/// Maximum number of outcome records retained per gate for scoring purposes.
const OUTCOME_HISTORY_CAP: usize = 256;

/// The lifecycle state of a [`crate::ReliabilityGate`].
///
/// ```text
///        failure_count >= failure_threshold
///   CLOSED ───────────────────────────► OPEN
///     ▲                                   │
///     │ success_count_in_half_open         │ elapsed >= backoff(reset_timeout, half_open_attempts)
///     │   >= success_threshold             ▼
///   HALF_OPEN ◄───────────────────── (admits one probe)
///     │
///     │ failure_count >= deconstruction_threshold
///     ▼
///   DECONSTRUCTED ──────────────────► HALF_OPEN
///       consecutive_successes >= deconstruction_recovery_factor * success_threshold
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateState {
    /// Calls flow through normally; failures are counted.
    Closed,
    /// Calls are rejected outright until the backoff window elapses.
    Open,
    /// A limited number of probe calls are admitted to test recovery.
    HalfOpen,
    /// The backend has been retired after repeated failed recovery attempts.
    /// Only an explicit [`crate::ReliabilityGate::reset`] (or, per the
    /// documented state table, enough consecutive successes) clears this.
    Deconstructed,
}

impl GateState {
    /// Compact representation stored in the gate's lock-free state mirror.
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            GateState::Closed => 0,
            GateState::Open => 1,
            GateState::HalfOpen => 2,
            GateState::Deconstructed => 3,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => GateState::Closed,
            1 => GateState::Open,
            2 => GateState::HalfOpen,
            _ => GateState::Deconstructed,
        }
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateState::Closed => "closed",
            GateState::Open => "open",
            GateState::HalfOpen => "half_open",
            GateState::Deconstructed => "deconstructed",
        };
        f.write_str(s)
    }
}

/// A single recorded failure, retained for diagnostics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecord {
    #[cfg_attr(feature = "serde", serde(skip, default = "Instant::now"))]
    pub occurred_at: Instant,
    pub message: String,
    pub state_at_failure: GateState,
    pub retryable: bool,
}

/// The outcome of a single guarded call, retained so a
/// [`crate::GateRegistry`] can feed backend scoring upstream.
#[derive(Debug, Clone)]
pub struct BackendOutcomeRecord {
    pub occurred_at: Instant,
    pub success: bool,
    pub latency: Duration,
}

/// Internal, lock-guarded state. All mutation happens through
/// [`GateMachine`] methods so the transition table lives in one place.
pub(crate) struct GateMachine {
    pub(crate) state: GateState,
    /// Monotone failure counter. Resets to 0 only on entering CLOSED and on
    /// a successful call while CLOSED; otherwise it accumulates across
    /// CLOSED→OPEN→HALF_OPEN cycles so repeated failed recovery attempts can
    /// be told apart from a single trip (used for the DECONSTRUCTED check).
    pub(crate) failure_count: u32,
    /// Successes observed during the *current* HALF_OPEN window.
    pub(crate) success_count_in_half_open: u32,
    /// Consecutive successes regardless of state; reset on any failure.
    /// Drives DECONSTRUCTED → HALF_OPEN recovery only.
    pub(crate) consecutive_successes: u32,
    pub(crate) half_open_attempts: u32,
    pub(crate) half_open_inflight: u32,
    pub(crate) total_calls: u64,
    pub(crate) total_successes: u64,
    pub(crate) total_failures: u64,
    pub(crate) last_failure_at: Option<Instant>,
    pub(crate) last_success_at: Option<Instant>,
    pub(crate) state_entered_at: Instant,
    pub(crate) half_open_entered_at: Option<Instant>,
    pub(crate) errors: VecDeque<ErrorRecord>,
    pub(crate) outcomes: VecDeque<BackendOutcomeRecord>,
}

impl GateMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: GateState::Closed,
            failure_count: 0,
            success_count_in_half_open: 0,
            consecutive_successes: 0,
            half_open_attempts: 0,
            half_open_inflight: 0,
            total_calls: 0,
            total_successes: 0,
            total_failures: 0,
            last_failure_at: None,
            last_success_at: None,
            state_entered_at: Instant::now(),
            half_open_entered_at: None,
            errors: VecDeque::new(),
            outcomes: VecDeque::new(),
        }
    }

    /// Duration the gate stays OPEN before admitting another probe, given
    /// how many HALF_OPEN attempts have already been made. Backoff doubles
    /// per attempt, capped at 2^5.
    pub(crate) fn backoff(base: Duration, half_open_attempts: u32) -> Duration {
        let exponent = half_open_attempts.min(5);
        base * 2u32.pow(exponent)
    }

    pub(crate) fn push_error(&mut self, message: String, state_at_failure: GateState, retryable: bool) {
        if self.errors.len() >= ERROR_HISTORY_CAP {
            self.errors.pop_front();
        }
        self.errors.push_back(ErrorRecord {
            occurred_at: Instant::now(),
            message,
            state_at_failure,
            retryable,
        });
    }

    pub(crate) fn push_outcome(&mut self, success: bool, latency: Duration) {
        if self.outcomes.len() >= OUTCOME_HISTORY_CAP {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(BackendOutcomeRecord {
            occurred_at: Instant::now(),
            success,
            latency,
        });
    }

    /// Lifetime success rate (`total_successes / total_calls`); `1.0` with
    /// no calls yet.
    pub(crate) fn lifetime_success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        self.total_successes as f64 / self.total_calls as f64
    }

    /// Mean latency across retained outcomes, or zero with no history.
    pub(crate) fn mean_latency(&self) -> Duration {
        if self.outcomes.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.outcomes.iter().map(|o| o.latency).sum();
        total / self.outcomes.len() as u32
    }

    /// Transitions to a new state, resetting the counters that are scoped to
    /// a single state's lifetime and stamping `state_entered_at`.
    pub(crate) fn enter(&mut self, state: GateState) {
        self.state = state;
        self.state_entered_at = Instant::now();
        match state {
            GateState::Closed => {
                self.failure_count = 0;
                self.success_count_in_half_open = 0;
                self.half_open_attempts = 0;
                self.half_open_inflight = 0;
                self.half_open_entered_at = None;
            }
            GateState::Open => {
                self.success_count_in_half_open = 0;
                self.half_open_inflight = 0;
                self.half_open_entered_at = None;
            }
            GateState::HalfOpen => {
                self.success_count_in_half_open = 0;
                self.half_open_inflight = 0;
                self.half_open_entered_at = Some(self.state_entered_at);
            }
            GateState::Deconstructed => {
                self.half_open_inflight = 0;
            }
        }
    }
}
