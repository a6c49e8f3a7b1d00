//! Cross-crate discovery scenarios, run through the `gateway` facade crate
//! rather than `gateway-orchestrator` directly, so the umbrella crate's
//! re-exports are exercised the way a downstream consumer would use them.

use gateway::orchestrator::testing::{BagOfWordsEmbeddingModel, BruteForceVectorIndex, InMemoryCache, InMemoryToolRegistry};
use gateway::orchestrator::{CapabilityGraph, DiscoveryContext, OrchestratorConfig, SemanticOrchestrator, Tool};
use gateway::reliability::{GateConfig, GateRegistry};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct BackendError(&'static str);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn tool(id: &str, name: &str, description: &str, capabilities: &[&str], requires_auth: bool) -> Tool {
    Tool {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        backend_id: "backend".to_string(),
        backend_name: "backend".to_string(),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        requires_auth,
    }
}

fn orchestrator(tools: Vec<Tool>) -> SemanticOrchestrator<BackendError> {
    let registry: Arc<GateRegistry<BackendError>> = Arc::new(GateRegistry::with_default_config(GateConfig::standard()));
    SemanticOrchestrator::new(
        Arc::new(InMemoryToolRegistry::new(tools)),
        Arc::new(InMemoryCache::new()),
        Arc::new(BagOfWordsEmbeddingModel::new()),
        Arc::new(BruteForceVectorIndex::new()),
        registry,
        Arc::new(CapabilityGraph::new()),
        OrchestratorConfig::default(),
    )
}

/// Scenario 4: tools A/B/C with descriptions "read file" / "write file" /
/// "send email", intent "open a document" — A ranks first.
#[tokio::test]
async fn discovery_ranking_prefers_the_closer_semantic_match() {
    let orchestrator = orchestrator(vec![
        tool("a", "read file", "read file", &[], false),
        tool("b", "write file", "write file", &[], false),
        tool("c", "send email", "send email", &[], false),
    ]);
    orchestrator.rebuild_index().await.unwrap();

    let context = DiscoveryContext::new();
    let results = orchestrator.discover_tools("open a document", &context, Some(3)).await.unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].tool.id, "a");
}

/// Scenario 6: a context requiring `["search"]` plus `auth_required: true`
/// filters out a tool with `capabilities=["search","read"]` and
/// `requires_auth=false`; the same tool with `requires_auth=true` is kept.
#[tokio::test]
async fn capability_and_auth_filtering() {
    let unauthenticated = orchestrator(vec![tool("search-tool", "search", "search the web", &["search", "read"], false)]);
    unauthenticated.rebuild_index().await.unwrap();
    let context = DiscoveryContext::new().with_required_capabilities(["search".to_string()]).with_auth_required(true);
    let results = unauthenticated.discover_tools("find something", &context, Some(5)).await.unwrap();
    assert!(results.is_empty(), "tool without requires_auth must be filtered out under auth_required");

    let authenticated = orchestrator(vec![tool("search-tool", "search", "search the web", &["search", "read"], true)]);
    authenticated.rebuild_index().await.unwrap();
    let results = authenticated.discover_tools("find something", &context, Some(5)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool.id, "search-tool");
}

/// A tool whose capability set is missing a required capability entirely
/// (independent of auth) is filtered out regardless of ranking.
#[tokio::test]
async fn missing_required_capability_filters_out_the_tool() {
    let orchestrator = orchestrator(vec![tool("read-only", "read file", "read file contents", &["read"], false)]);
    orchestrator.rebuild_index().await.unwrap();

    let context = DiscoveryContext::new().with_required_capabilities(["write".to_string()]);
    let results = orchestrator.discover_tools("read a document", &context, Some(5)).await.unwrap();
    assert!(results.iter().all(|r| r.tool.id != "read-only"));
}
