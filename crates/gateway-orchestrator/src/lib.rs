//! Semantic tool discovery, context-aware filtering, multi-factor scoring,
//! and dependency-aware execution planning over a backend tool catalog.
//!
//! A [`SemanticOrchestrator`] owns the vector index over tool descriptions
//! and reads per-backend availability and history from a
//! [`gateway_reliability::GateRegistry`], so the state driving live call
//! admission and the state driving backend scoring are always the same
//! data.

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
mod history;
mod orchestrator;
pub mod plan;
mod score;
pub mod testing;
pub mod tool;
pub mod traits;

pub use capability::CapabilityGraph;
pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use context::DiscoveryContext;
pub use error::OrchestratorError;
pub use events::OrchestratorEvent;
pub use orchestrator::SemanticOrchestrator;
pub use plan::{CallDescriptor, ExecutionPlan, MAX_PARALLEL};
pub use score::ToolScore;
pub use tool::Tool;
pub use traits::{CacheBackend, EmbeddingModel, ToolRegistry, VectorIndex};
