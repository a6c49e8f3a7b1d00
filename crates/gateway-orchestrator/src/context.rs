//! The structured context accompanying a discovery request.

use std::collections::BTreeSet;

/// Structured context accompanying a discovery intent.
///
/// Replaces a dynamic key/value map with an explicit record of the
/// recognised fields (see the component design for the effect each one
/// has on filtering and scoring); `extra` accepts forward-compatible data
/// that does not affect behaviour but is still folded into the cache key so
/// two requests that differ only in an unrecognised field are not
/// conflated.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryContext {
    /// A tool survives filtering only if its capability set is a superset
    /// of this one.
    pub required_capabilities: BTreeSet<String>,
    /// If true, only tools declaring `requires_auth` survive filtering.
    pub auth_required: bool,
    /// Scopes the historical-use bonus in context relevance scoring.
    pub session_id: Option<String>,
    /// Names a workflow in the capability graph; membership yields a
    /// context-relevance bonus.
    pub workflow_type: Option<String>,
    /// Unrecognised fields, ignored for behaviour but included in the cache
    /// key so they still distinguish otherwise-identical requests.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required_capabilities(mut self, caps: impl IntoIterator<Item = String>) -> Self {
        self.required_capabilities = caps.into_iter().collect();
        self
    }

    pub fn with_auth_required(mut self, required: bool) -> Self {
        self.auth_required = required;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_workflow_type(mut self, workflow_type: impl Into<String>) -> Self {
        self.workflow_type = Some(workflow_type.into());
        self
    }

    /// Deterministic JSON form used to build the cache key digest: fields in
    /// a fixed order, `extra`'s keys sorted (`serde_json::Map` is
    /// insertion-ordered by default, so the prototype's `sort_keys=True`
    /// behaviour is reproduced explicitly via `BTreeMap`).
    pub(crate) fn canonical_json(&self) -> serde_json::Value {
        let sorted_extra: std::collections::BTreeMap<String, serde_json::Value> =
            self.extra.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        serde_json::json!({
            "required_capabilities": self.required_capabilities,
            "auth_required": self.auth_required,
            "session_id": self.session_id,
            "workflow_type": self.workflow_type,
            "extra": sorted_extra,
        })
    }
}
