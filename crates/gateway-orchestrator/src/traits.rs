//! The external collaborators the orchestrator consumes: tool registry,
//! cache, embedding model, vector index. Each is modeled as a trait only —
//! no concrete network client ships in this crate.

use crate::error::OrchestratorError;
use crate::score::ToolScore;
use crate::tool::Tool;
use async_trait::async_trait;
use std::time::Duration;

/// Source of truth for the backend/tool catalog. No tool identifiers may be
/// invented by the orchestrator; everything it ranks comes from here.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    async fn get_all_tools(&self) -> Result<Vec<Tool>, OrchestratorError>;
}

/// Opaque keyed byte-store with TTL, used to memoize discovery results.
///
/// A `get` error is treated as a cache miss by the orchestrator, not as a
/// fatal error (see [`OrchestratorError`] docs); a `set` error is logged
/// (when the `tracing` feature is enabled) and otherwise ignored.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<ToolScore>>, OrchestratorError>;
    async fn set(&self, key: &str, value: Vec<ToolScore>, ttl: Duration) -> Result<(), OrchestratorError>;
}

/// Text → fixed-dimensional vector representation. `dimension()` is constant
/// per model instance.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OrchestratorError>;
    fn dimension(&self) -> usize;
}

/// Nearest-neighbour search over tool embeddings, ordered by ascending L2
/// distance.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(&self, vectors: Vec<Vec<f32>>) -> Result<(), OrchestratorError>;
    /// Returns up to `k` `(handle, distance)` pairs, ascending by distance.
    /// `handle` is the position the vector was added at, stable across
    /// `add` calls (the registry is append-only from the orchestrator's
    /// perspective — see [`crate::SemanticOrchestrator::rebuild_index`]).
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, OrchestratorError>;
}
