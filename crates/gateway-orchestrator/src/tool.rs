//! The tool catalog's data shape, as observed from the registry.

use std::collections::BTreeSet;

/// A single invocable capability hosted by a backend.
///
/// The orchestrator treats this as read-only, registry-owned data: it never
/// invents a tool id, and the registry remains the sole source of truth for
/// the catalog (see [`crate::ToolRegistry`]).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub backend_id: String,
    pub backend_name: String,
    pub capabilities: BTreeSet<String>,
    pub requires_auth: bool,
}

impl Tool {
    /// The text embedded to place this tool in the semantic index:
    /// `"<backend_name> <name> <description>"`.
    pub fn index_text(&self) -> String {
        format!("{} {} {}", self.backend_name, self.name, self.description)
    }

    /// The text embedded for the tool-level relevance score:
    /// `"<name> <description>"`.
    pub fn scoring_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}
