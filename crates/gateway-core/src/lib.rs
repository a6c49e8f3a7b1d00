//! Shared infrastructure for the gateway's reliability and orchestration crates.
//!
//! This crate provides the ambient functionality both `gateway-reliability`
//! and `gateway-orchestrator` build on:
//! - Event system for observability (state transitions, call admission, cache hits)
//! - Common panic-safe listener dispatch shared by both patterns

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
