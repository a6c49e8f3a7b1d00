//! Execution history the scorer and planner draw on beyond what a
//! [`gateway_reliability::GateRegistry`] already tracks per backend: per-tool
//! latency (for duration estimation) and per-session successful tool use
//! (for the context-relevance bonus).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Bound applied to both per-tool latency history and per-session use
/// history, matching the gate's own outcome-history cap.
const HISTORY_CAP: usize = 256;

struct SessionUse {
    tool_id: String,
    success: bool,
}

/// Thread-safe, in-memory execution history keyed by tool id and by
/// session id. Populated by [`crate::SemanticOrchestrator::record_execution`]
/// after a caller actually invokes a planned tool; the orchestrator itself
/// never invokes tools.
#[derive(Default)]
pub(crate) struct ExecutionHistory {
    tool_durations: Mutex<HashMap<String, VecDeque<Duration>>>,
    session_uses: Mutex<HashMap<String, VecDeque<SessionUse>>>,
}

impl ExecutionHistory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, tool_id: &str, session_id: Option<&str>, success: bool, latency: Duration) {
        {
            let mut durations = self.tool_durations.lock().unwrap();
            let entry = durations.entry(tool_id.to_string()).or_default();
            if entry.len() >= HISTORY_CAP {
                entry.pop_front();
            }
            entry.push_back(latency);
        }
        if let Some(session_id) = session_id {
            let mut sessions = self.session_uses.lock().unwrap();
            let entry = sessions.entry(session_id.to_string()).or_default();
            if entry.len() >= HISTORY_CAP {
                entry.pop_front();
            }
            entry.push_back(SessionUse {
                tool_id: tool_id.to_string(),
                success,
            });
        }
    }

    /// Mean observed latency for `tool_id`, or `default` with no history.
    pub(crate) fn mean_duration(&self, tool_id: &str, default: Duration) -> Duration {
        let durations = self.tool_durations.lock().unwrap();
        match durations.get(tool_id) {
            Some(entries) if !entries.is_empty() => {
                let total: Duration = entries.iter().sum();
                total / entries.len() as u32
            }
            _ => default,
        }
    }

    /// Count of successful prior uses of `tool_id` within `session_id`.
    pub(crate) fn successful_uses_in_session(&self, tool_id: &str, session_id: &str) -> usize {
        let sessions = self.session_uses.lock().unwrap();
        match sessions.get(session_id) {
            Some(entries) => entries.iter().filter(|e| e.tool_id == tool_id && e.success).count(),
            None => 0,
        }
    }
}
