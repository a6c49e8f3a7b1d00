//! Error type returned by orchestrator collaborators and operations.

use thiserror::Error;

/// Error produced by the semantic orchestrator or one of its external
/// collaborators (tool registry, cache, embedding model, vector index).
///
/// A cache-layer error is explicitly non-fatal at the call site: a failed
/// `get` is treated as a cache miss (see [`crate::SemanticOrchestrator::discover_tools`]).
/// Every other variant propagates to the caller.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("tool registry error: {0}")]
    Registry(String),

    #[error("cache backend error: {0}")]
    Cache(String),

    #[error("embedding model error: {0}")]
    Embedding(String),

    #[error("vector index error: {0}")]
    VectorIndex(String),

    #[error("semantic index has not been built yet")]
    IndexNotBuilt,

    #[error("embedding model returned {returned} vectors for {requested} inputs")]
    EmbeddingDimensionMismatch { requested: usize, returned: usize },
}
