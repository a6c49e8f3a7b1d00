//! Configuration for a [`crate::SemanticOrchestrator`].

use gateway_core::events::{EventListeners, FnListener};
use std::time::Duration;

use crate::events::OrchestratorEvent;
use crate::plan::MAX_PARALLEL;

/// Tunables for a [`crate::SemanticOrchestrator`].
pub struct OrchestratorConfig {
    /// Results returned per discovery request unless overridden per call.
    pub default_top_k: usize,
    /// Multiplier applied to `top_k` to decide how many candidates to pull
    /// from the vector index before filtering/scoring narrows them down.
    pub candidate_multiplier: usize,
    /// TTL applied to cached discovery results.
    pub cache_ttl: Duration,
    /// Stage size ceiling before a group is split into sequential stages.
    pub max_parallel: usize,
    /// Default assumed duration for a tool with no execution history.
    pub default_tool_duration: Duration,
    pub(crate) listeners: EventListeners<OrchestratorEvent>,
}

impl Clone for OrchestratorConfig {
    fn clone(&self) -> Self {
        Self {
            default_top_k: self.default_top_k,
            candidate_multiplier: self.candidate_multiplier,
            cache_ttl: self.cache_ttl,
            max_parallel: self.max_parallel,
            default_tool_duration: self.default_tool_duration,
            listeners: self.listeners.clone(),
        }
    }
}

impl OrchestratorConfig {
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::new()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`OrchestratorConfig`].
pub struct OrchestratorConfigBuilder {
    default_top_k: usize,
    candidate_multiplier: usize,
    cache_ttl: Duration,
    max_parallel: usize,
    default_tool_duration: Duration,
    listeners: EventListeners<OrchestratorEvent>,
}

impl OrchestratorConfigBuilder {
    pub fn new() -> Self {
        Self {
            default_top_k: 5,
            candidate_multiplier: 4,
            cache_ttl: Duration::from_secs(300),
            max_parallel: MAX_PARALLEL,
            default_tool_duration: Duration::from_millis(100),
            listeners: EventListeners::new(),
        }
    }

    pub fn default_top_k(mut self, n: usize) -> Self {
        self.default_top_k = n;
        self
    }

    pub fn candidate_multiplier(mut self, n: usize) -> Self {
        self.candidate_multiplier = n;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n;
        self
    }

    pub fn default_tool_duration(mut self, d: Duration) -> Self {
        self.default_tool_duration = d;
        self
    }

    /// Registers a listener invoked on every emitted [`OrchestratorEvent`].
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&OrchestratorEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    pub fn build(self) -> OrchestratorConfig {
        OrchestratorConfig {
            default_top_k: self.default_top_k,
            candidate_multiplier: self.candidate_multiplier,
            cache_ttl: self.cache_ttl,
            max_parallel: self.max_parallel,
            default_tool_duration: self.default_tool_duration,
            listeners: self.listeners,
        }
    }
}

impl Default for OrchestratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
