//! Routing and reliability core for a multi-backend tool orchestration
//! gateway.
//!
//! `gateway` bundles two subsystems, each usable independently or together:
//!
//! - **[reliability]** — a four-state circuit breaker (`CLOSED` /
//!   `OPEN` / `HALF_OPEN` / `DECONSTRUCTED`) guarding calls to a backend,
//!   with exponential-backoff recovery and fallback support.
//! - **[orchestrator]** — semantic tool discovery over a backend catalog,
//!   multi-factor scoring that blends backend reliability with semantic
//!   relevance, and dependency-aware execution planning.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! gateway = { version = "0.1", features = ["reliability", "orchestrator"] }
//! ```
//!
//! The two subsystems share state rather than duplicating it: a
//! [`gateway_orchestrator::SemanticOrchestrator`] reads per-backend
//! availability and call history directly from the same
//! [`gateway_reliability::GateRegistry`] that gates live traffic, so a tool
//! whose backend is currently open is never recommended, and a tool's
//! server score reflects the exact outcomes the gate itself recorded.

// Re-export core (always available)
pub use gateway_core as core;

// Re-export subsystems based on features
#[cfg(feature = "reliability")]
pub use gateway_reliability as reliability;

#[cfg(feature = "orchestrator")]
pub use gateway_orchestrator as orchestrator;
