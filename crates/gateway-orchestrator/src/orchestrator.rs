//! [`SemanticOrchestrator`]: tool discovery, context filtering, multi-factor
//! scoring, and dependency-aware execution planning.

use crate::capability::CapabilityGraph;
use crate::config::OrchestratorConfig;
use crate::context::DiscoveryContext;
use crate::error::OrchestratorError;
use crate::events::OrchestratorEvent;
use crate::history::ExecutionHistory;
use crate::plan::{self, CallDescriptor, ExecutionPlan};
use crate::score::{self, ToolScore};
use crate::tool::Tool;
use crate::traits::{CacheBackend, EmbeddingModel, ToolRegistry, VectorIndex};
use gateway_reliability::GateRegistry;
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};
use md5::{Digest, Md5};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Owns the tool vector index, context filter, scorer, dependency analyser,
/// and planner; consumes a [`GateRegistry`] for per-backend availability and
/// historical performance, and a [`CapabilityGraph`] for workflow
/// membership.
///
/// `E` is the backend error type shared with the [`GateRegistry`] this
/// orchestrator reads from. The orchestrator never invokes a backend
/// itself, so it never produces or consumes a value of type `E`.
pub struct SemanticOrchestrator<E> {
    tool_registry: Arc<dyn ToolRegistry>,
    cache: Arc<dyn CacheBackend>,
    embedding_model: Arc<dyn EmbeddingModel>,
    vector_index: Arc<dyn VectorIndex>,
    gate_registry: Arc<GateRegistry<E>>,
    capability_graph: Arc<CapabilityGraph>,
    config: OrchestratorConfig,
    events: Arc<gateway_core::events::EventListeners<OrchestratorEvent>>,
    history: ExecutionHistory,
    /// Stable integer handle (the vector index's `add` position) to the
    /// tool it represents, rebuilt wholesale by [`Self::rebuild_index`].
    index_to_tool: RwLock<Vec<Tool>>,
}

impl<E> SemanticOrchestrator<E>
where
    E: std::fmt::Display + Send + 'static,
{
    pub fn new(
        tool_registry: Arc<dyn ToolRegistry>,
        cache: Arc<dyn CacheBackend>,
        embedding_model: Arc<dyn EmbeddingModel>,
        vector_index: Arc<dyn VectorIndex>,
        gate_registry: Arc<GateRegistry<E>>,
        capability_graph: Arc<CapabilityGraph>,
        config: OrchestratorConfig,
    ) -> Self {
        let events = Arc::new(config.listeners.clone());
        Self {
            tool_registry,
            cache,
            embedding_model,
            vector_index,
            gate_registry,
            capability_graph,
            config,
            events,
            history: ExecutionHistory::new(),
            index_to_tool: RwLock::new(Vec::new()),
        }
    }

    /// Fetches the full catalog from the tool registry, embeds each tool's
    /// index text (`"<backend_name> <name> <description>"`), and inserts
    /// the embeddings into the vector index.
    ///
    /// Mirrors rebuilding a search index from scratch: call this once at
    /// startup, and again after catalog changes if the configured
    /// [`VectorIndex`] discards prior contents on `add`; an index that only
    /// appends would accumulate duplicate entries across repeated calls.
    pub async fn rebuild_index(&self) -> Result<(), OrchestratorError> {
        let tools = self.tool_registry.get_all_tools().await?;
        if tools.is_empty() {
            *self.index_to_tool.write().unwrap() = Vec::new();
            return Ok(());
        }

        let texts: Vec<String> = tools.iter().map(Tool::index_text).collect();
        let embeddings = self.embedding_model.encode(&texts).await?;
        if embeddings.len() != tools.len() {
            return Err(OrchestratorError::EmbeddingDimensionMismatch {
                requested: tools.len(),
                returned: embeddings.len(),
            });
        }

        self.vector_index.add(embeddings).await?;
        *self.index_to_tool.write().unwrap() = tools;
        Ok(())
    }

    /// Discovers the `top_k` tools most relevant to `intent` under `context`.
    ///
    /// Probes the cache first; on miss, searches the vector index for
    /// `candidate_multiplier · top_k` nearest tools, filters by context,
    /// scores the survivors, sorts by ranking key descending, and caches
    /// the top-K result.
    pub async fn discover_tools(
        &self,
        intent: &str,
        context: &DiscoveryContext,
        top_k: Option<usize>,
    ) -> Result<Vec<ToolScore>, OrchestratorError> {
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let cache_key = self.cache_key(intent, context);

        match self.cache.get(&cache_key).await {
            Ok(Some(cached)) => {
                #[cfg(feature = "metrics")]
                counter!("orchestrator_cache_hits_total").increment(1);
                self.emit(OrchestratorEvent::CacheHit { cache_key, timestamp: Instant::now() });
                return Ok(cached);
            }
            Ok(None) => {
                #[cfg(feature = "metrics")]
                counter!("orchestrator_cache_misses_total").increment(1);
                self.emit(OrchestratorEvent::CacheMiss { cache_key: cache_key.clone(), timestamp: Instant::now() });
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(cache_key = %cache_key, error = %err, "cache probe failed, treating as miss");
                self.emit(OrchestratorEvent::CacheError {
                    cache_key: cache_key.clone(),
                    timestamp: Instant::now(),
                    message: err.to_string(),
                });
            }
        }

        let started = Instant::now();

        let intent_embedding = self.embed_one(intent).await?;
        let candidate_count = top_k * self.config.candidate_multiplier;
        let hits = self.vector_index.search(&intent_embedding, candidate_count).await?;

        let candidates: Vec<Tool> = {
            let index_to_tool = self.index_to_tool.read().unwrap();
            hits.into_iter().filter_map(|(handle, _distance)| index_to_tool.get(handle).cloned()).collect()
        };

        let filtered: Vec<Tool> = candidates.into_iter().filter(|tool| self.matches_context(tool, context)).collect();

        let scored = self.score_tools(&filtered, &intent_embedding, context).await?;

        #[cfg(feature = "metrics")]
        histogram!("orchestrator_discovery_duration_seconds").record(started.elapsed().as_secs_f64());
        #[cfg(not(feature = "metrics"))]
        let _ = started;

        let top: Vec<ToolScore> = scored.into_iter().take(top_k).collect();

        if let Err(err) = self.cache.set(&cache_key, top.clone(), self.config.cache_ttl).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(cache_key = %cache_key, error = %err, "failed to populate discovery cache");
            let _ = err;
        }

        self.emit(OrchestratorEvent::DiscoveryCompleted {
            intent: intent.to_string(),
            timestamp: Instant::now(),
            candidates_returned: top.len(),
        });

        Ok(top)
    }

    /// Builds a dependency-aware [`ExecutionPlan`] for `calls`: independent
    /// calls are grouped into a shared parallel stage (bounded by
    /// `max_parallel`), calls that depend on another call's output are
    /// placed into a later stage, and the plan's total duration is
    /// estimated from this orchestrator's recorded execution history (see
    /// [`Self::record_execution`]).
    pub fn create_execution_plan(&self, calls: &[CallDescriptor]) -> ExecutionPlan {
        let stages = plan::plan_stages(calls, self.config.max_parallel);
        let default = self.config.default_tool_duration;

        let mut estimated_duration = Duration::ZERO;
        for stage in &stages {
            let stage_duration = stage
                .iter()
                .map(|call_id| self.history.mean_duration(call_id, default))
                .max()
                .unwrap_or(default);
            estimated_duration += stage_duration;
        }

        self.emit(OrchestratorEvent::PlanCreated {
            timestamp: Instant::now(),
            stage_count: stages.len(),
            estimated_duration_ms: estimated_duration.as_secs_f64() * 1000.0,
        });

        ExecutionPlan { stages, estimated_duration }
    }

    /// Records the outcome of an actual tool invocation so future scoring
    /// (server score, via the gate's own history; context relevance, via
    /// session use) and future duration estimates reflect it. The
    /// orchestrator never calls this itself — it never invokes tools.
    pub fn record_execution(&self, tool_id: &str, session_id: Option<&str>, success: bool, latency: Duration) {
        self.history.record(tool_id, session_id, success, latency);
    }

    fn matches_context(&self, tool: &Tool, context: &DiscoveryContext) -> bool {
        if !context.required_capabilities.is_subset(&tool.capabilities) {
            return false;
        }
        if context.auth_required && !tool.requires_auth {
            return false;
        }
        if let Some(gate) = self.gate_registry.existing_gate(&tool.backend_id) {
            if !gate.is_available() {
                return false;
            }
        }
        true
    }

    async fn score_tools(
        &self,
        tools: &[Tool],
        intent_embedding: &[f32],
        context: &DiscoveryContext,
    ) -> Result<Vec<ToolScore>, OrchestratorError> {
        if tools.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = tools.iter().map(Tool::scoring_text).collect();
        let embeddings = self.embedding_model.encode(&texts).await?;
        if embeddings.len() != tools.len() {
            return Err(OrchestratorError::EmbeddingDimensionMismatch {
                requested: tools.len(),
                returned: embeddings.len(),
            });
        }

        let mut scored: Vec<ToolScore> = tools
            .iter()
            .zip(embeddings.iter())
            .map(|(tool, tool_embedding)| {
                let outcomes =
                    self.gate_registry.existing_gate(&tool.backend_id).map(|g| g.outcome_history()).unwrap_or_default();
                let server_score = score::server_score(&outcomes);
                let tool_score = score::cosine_similarity(intent_embedding, tool_embedding);
                let combined_score = score::combined_score(server_score, tool_score);

                let session_uses = context
                    .session_id
                    .as_deref()
                    .map(|session_id| self.history.successful_uses_in_session(&tool.id, session_id))
                    .unwrap_or(0);
                let in_workflow = context
                    .workflow_type
                    .as_deref()
                    .map(|workflow_type| self.capability_graph.tool_in_workflow(&tool.id, workflow_type))
                    .unwrap_or(false);
                let context_relevance = score::context_relevance(session_uses, in_workflow);

                ToolScore { tool: tool.clone(), server_score, tool_score, combined_score, context_relevance }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.ranking_key().partial_cmp(&a.ranking_key()).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.tool.id.cmp(&b.tool.id))
        });

        Ok(scored)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, OrchestratorError> {
        let mut vectors = self.embedding_model.encode(std::slice::from_ref(&text.to_string())).await?;
        vectors.pop().ok_or(OrchestratorError::EmbeddingDimensionMismatch { requested: 1, returned: 0 })
    }

    /// `hex(md5(intent || canonical_json(context)))`, matching the
    /// prototype's cache-key digest exactly (a cache index, not a security
    /// boundary, so the weaker hash is kept rather than upgraded).
    fn cache_key(&self, intent: &str, context: &DiscoveryContext) -> String {
        let context_json = serde_json::to_string(&context.canonical_json()).unwrap_or_default();
        let combined = format!("{intent}:{context_json}");
        let mut hasher = Md5::new();
        hasher.update(combined.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn emit(&self, event: OrchestratorEvent) {
        self.events.emit(&event);
    }
}
