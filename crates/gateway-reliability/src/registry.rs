//! [`GateRegistry`]: owns one [`ReliabilityGate`] per backend.

use crate::config::GateConfig;
use crate::gate::{GateMetrics, ReliabilityGate};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Creates a [`GateConfig`] for a newly registered backend. Implementations
/// typically close over a base config and vary it per backend (e.g. a
/// tighter `failure_threshold` for a known-flaky backend).
pub trait GateConfigFactory<E>: Send + Sync {
    fn config_for(&self, backend_id: &str) -> GateConfig<E>;
}

impl<E, F> GateConfigFactory<E> for F
where
    F: Fn(&str) -> GateConfig<E> + Send + Sync,
{
    fn config_for(&self, backend_id: &str) -> GateConfig<E> {
        self(backend_id)
    }
}

/// Owns and lazily creates a [`ReliabilityGate`] per backend id.
///
/// A single registry is normally shared across a whole gateway: every
/// outbound tool call looks up (or creates) its backend's gate here before
/// dispatching, so the state the `SemanticOrchestrator` uses for server
/// scoring and the state gating live traffic are the same data.
pub struct GateRegistry<E> {
    gates: RwLock<HashMap<String, ReliabilityGate<E>>>,
    factory: Arc<dyn GateConfigFactory<E>>,
}

impl<E> GateRegistry<E>
where
    E: std::fmt::Display + Send + 'static,
{
    /// Creates a registry that configures every backend identically.
    pub fn with_default_config(config: GateConfig<E>) -> Self
    where
        E: 'static,
    {
        Self::with_factory(move |_: &str| config.clone())
    }

    /// Creates a registry that derives each backend's config from its id.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: GateConfigFactory<E> + 'static,
    {
        Self {
            gates: RwLock::new(HashMap::new()),
            factory: Arc::new(factory),
        }
    }

    /// Returns the gate for `backend_id`, creating and registering one via
    /// the configured factory if it doesn't exist yet.
    pub fn gate(&self, backend_id: &str) -> ReliabilityGate<E> {
        if let Some(gate) = self.gates.read().unwrap().get(backend_id) {
            return gate.clone();
        }
        let mut gates = self.gates.write().unwrap();
        gates
            .entry(backend_id.to_string())
            .or_insert_with(|| ReliabilityGate::new(backend_id, self.factory.config_for(backend_id)))
            .clone()
    }

    /// Returns a gate only if one has already been created for `backend_id`.
    pub fn existing_gate(&self, backend_id: &str) -> Option<ReliabilityGate<E>> {
        self.gates.read().unwrap().get(backend_id).cloned()
    }

    /// Snapshots every registered gate's metrics, keyed by backend id.
    pub fn snapshot(&self) -> HashMap<String, GateMetrics> {
        self.gates
            .read()
            .unwrap()
            .iter()
            .map(|(id, gate)| (id.clone(), gate.metrics()))
            .collect()
    }

    /// Lists the backend ids with a registered gate.
    pub fn backend_ids(&self) -> Vec<String> {
        self.gates.read().unwrap().keys().cloned().collect()
    }

    /// Removes a backend's gate entirely, e.g. when it's deprovisioned.
    pub fn remove(&self, backend_id: &str) -> Option<ReliabilityGate<E>> {
        self.gates.write().unwrap().remove(backend_id)
    }

    /// Forces every registered gate back to CLOSED, clearing its counters.
    /// Administrative recovery for the whole registry at once, e.g. after
    /// resolving an incident that tripped several backends' gates together.
    pub fn reset_all(&self) {
        for gate in self.gates.read().unwrap().values() {
            gate.reset();
        }
    }
}
