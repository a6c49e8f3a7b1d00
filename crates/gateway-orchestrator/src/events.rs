//! Events emitted by a [`crate::SemanticOrchestrator`] for observability.

use gateway_core::ResilienceEvent;
use std::time::Instant;

/// An observable event emitted during a discovery or planning request.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A discovery request was served from cache without querying the
    /// vector index.
    CacheHit { cache_key: String, timestamp: Instant },
    /// A discovery request missed the cache and ran the full search.
    CacheMiss { cache_key: String, timestamp: Instant },
    /// A `CacheBackend` call failed; treated as a miss, not fatal.
    CacheError { cache_key: String, timestamp: Instant, message: String },
    /// A discovery request completed.
    DiscoveryCompleted { intent: String, timestamp: Instant, candidates_returned: usize },
    /// An execution plan was produced.
    PlanCreated { timestamp: Instant, stage_count: usize, estimated_duration_ms: f64 },
}

impl ResilienceEvent for OrchestratorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrchestratorEvent::CacheHit { .. } => "cache_hit",
            OrchestratorEvent::CacheMiss { .. } => "cache_miss",
            OrchestratorEvent::CacheError { .. } => "cache_error",
            OrchestratorEvent::DiscoveryCompleted { .. } => "discovery_completed",
            OrchestratorEvent::PlanCreated { .. } => "plan_created",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            OrchestratorEvent::CacheHit { timestamp, .. }
            | OrchestratorEvent::CacheMiss { timestamp, .. }
            | OrchestratorEvent::CacheError { timestamp, .. }
            | OrchestratorEvent::DiscoveryCompleted { timestamp, .. }
            | OrchestratorEvent::PlanCreated { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            OrchestratorEvent::CacheHit { cache_key, .. }
            | OrchestratorEvent::CacheMiss { cache_key, .. }
            | OrchestratorEvent::CacheError { cache_key, .. } => cache_key,
            OrchestratorEvent::DiscoveryCompleted { intent, .. } => intent,
            OrchestratorEvent::PlanCreated { .. } => "plan",
        }
    }
}
