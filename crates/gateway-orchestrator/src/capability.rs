//! A typed directed multigraph over tool ids, plus a named-workflow index.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Static relational index: which tools relate to which others (typed
/// edges), and which ordered tool lists make up a recognised workflow.
///
/// Mutation is expected to be rare compared to queries, so reads never block
/// each other; this mirrors the reliability gate's own
/// read-mostly/write-rare sharing pattern.
#[derive(Default)]
pub struct CapabilityGraph {
    edges: RwLock<HashMap<String, HashSet<(String, String)>>>,
    workflows: RwLock<HashMap<String, Vec<String>>>,
}

impl CapabilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a typed relation `tool_id -> (related_id, edge_kind)`.
    pub fn add_relation(&self, tool_id: impl Into<String>, related_id: impl Into<String>, edge_kind: impl Into<String>) {
        self.edges
            .write()
            .unwrap()
            .entry(tool_id.into())
            .or_default()
            .insert((related_id.into(), edge_kind.into()));
    }

    /// Tools related to `tool_id`, optionally filtered to a single edge kind.
    pub fn related_tools(&self, tool_id: &str, edge_kind: Option<&str>) -> Vec<String> {
        let edges = self.edges.read().unwrap();
        match edges.get(tool_id) {
            Some(related) => related
                .iter()
                .filter(|(_, kind)| match edge_kind {
                    Some(k) => k == kind,
                    None => true,
                })
                .map(|(id, _)| id.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Defines (or replaces) a workflow as an ordered sequence of tool ids.
    pub fn define_workflow(&self, workflow_type: impl Into<String>, tool_ids: Vec<String>) {
        self.workflows.write().unwrap().insert(workflow_type.into(), tool_ids);
    }

    /// The ordered tool ids making up `workflow_type`, or empty if unknown.
    pub fn workflow_tools(&self, workflow_type: &str) -> Vec<String> {
        self.workflows.read().unwrap().get(workflow_type).cloned().unwrap_or_default()
    }

    /// True iff `tool_id` is part of the named workflow.
    pub(crate) fn tool_in_workflow(&self, tool_id: &str, workflow_type: &str) -> bool {
        self.workflows
            .read()
            .unwrap()
            .get(workflow_type)
            .is_some_and(|tools| tools.iter().any(|id| id == tool_id))
    }
}
