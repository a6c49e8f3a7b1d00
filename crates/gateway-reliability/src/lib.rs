//! Per-backend reliability gating for outbound tool calls.
//!
//! A [`ReliabilityGate`] is a four-state circuit breaker — CLOSED, OPEN,
//! HALF_OPEN, and a terminal DECONSTRUCTED state reached after a backend
//! repeatedly fails its recovery probes. A [`GateRegistry`] owns one gate
//! per backend id, lazily created from a [`GateConfig`], and is the shared
//! source of truth both the live call path and upstream backend scoring
//! read from.

pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod registry;
mod state;

pub use config::{ErrorClassifier, GateConfig, GateConfigBuilder};
pub use error::GateError;
pub use events::GateEvent;
pub use gate::{BackendCall, GateMetrics, ReliabilityGate};
pub use registry::{GateConfigFactory, GateRegistry};
pub use state::{BackendOutcomeRecord, ErrorRecord, GateState};
