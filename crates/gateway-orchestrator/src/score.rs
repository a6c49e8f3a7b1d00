//! The multi-factor scoring algebra: server score, tool score, context
//! relevance, and their combination into a final ranking key.

use crate::tool::Tool;
use gateway_reliability::BackendOutcomeRecord;

/// A scored candidate tool, as returned by [`crate::SemanticOrchestrator::discover_tools`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToolScore {
    pub tool: Tool,
    /// Backend reliability/performance score, σ ∈ [0, 1].
    pub server_score: f64,
    /// Semantic relevance of the tool itself to the intent, τ ∈ [-1, 1].
    pub tool_score: f64,
    /// `(σ · τ) · max(σ, τ)`.
    pub combined_score: f64,
    /// Context fit bonus, ρ ∈ [0, 1].
    pub context_relevance: f64,
}

impl ToolScore {
    /// The final ranking key candidates are sorted by: `combined_score · (1 + context_relevance)`.
    pub fn ranking_key(&self) -> f64 {
        self.combined_score * (1.0 + self.context_relevance)
    }
}

/// Default server score for a backend with no recorded history.
const DEFAULT_SERVER_SCORE: f64 = 0.8;

/// Default per-tool duration assumed when no execution history exists.
pub(crate) const DEFAULT_TOOL_DURATION_MS: f64 = 100.0;

/// Server-level reliability/performance score, σ.
///
/// `0.8` with no history; otherwise `0.7·success_rate + 0.3·latency_score`
/// where `latency_score = 1 / (1 + mean_latency_ms / 1000)`.
pub(crate) fn server_score(outcomes: &[BackendOutcomeRecord]) -> f64 {
    if outcomes.is_empty() {
        return DEFAULT_SERVER_SCORE;
    }
    let successes = outcomes.iter().filter(|o| o.success).count();
    let success_rate = successes as f64 / outcomes.len() as f64;

    let total_latency_ms: f64 = outcomes.iter().map(|o| o.latency.as_secs_f64() * 1000.0).sum();
    let mean_latency_ms = total_latency_ms / outcomes.len() as f64;
    let latency_score = 1.0 / (1.0 + mean_latency_ms / 1000.0);

    0.7 * success_rate + 0.3 * latency_score
}

/// Cosine similarity between two embeddings. Vectors of unequal length are
/// treated as zero-padded to the longer one (an embedding model's
/// dimensionality is constant in production, but a growing-vocabulary
/// stand-in used in tests can otherwise drift between calls). Returns `0.0`
/// if either vector has zero norm (degenerate input, never a
/// divide-by-zero panic).
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().max(b.len());
    let at = |v: &[f32], i: usize| v.get(i).copied().unwrap_or(0.0);

    let dot: f32 = (0..len).map(|i| at(a, i) * at(b, i)).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Context relevance, ρ: `0.2` per prior successful use of this tool in the
/// same session, plus `0.3` if the tool belongs to the named workflow,
/// clamped to `[0, 1]`.
pub(crate) fn context_relevance(session_uses: usize, in_workflow: bool) -> f64 {
    let mut relevance = session_uses as f64 * 0.2;
    if in_workflow {
        relevance += 0.3;
    }
    relevance.min(1.0)
}

/// Combined score: `(σ · τ) · max(σ, τ)`.
pub(crate) fn combined_score(server_score: f64, tool_score: f64) -> f64 {
    (server_score * tool_score) * server_score.max(tool_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn server_score_defaults_with_no_history() {
        assert_eq!(server_score(&[]), DEFAULT_SERVER_SCORE);
    }

    #[test]
    fn server_score_blends_success_rate_and_latency() {
        let outcomes = vec![
            BackendOutcomeRecord { occurred_at: std::time::Instant::now(), success: true, latency: Duration::from_millis(500) },
            BackendOutcomeRecord { occurred_at: std::time::Instant::now(), success: false, latency: Duration::from_millis(500) },
        ];
        let score = server_score(&outcomes);
        // success_rate = 0.5, latency_score = 1/(1+0.5) = 0.6667
        let expected = 0.7 * 0.5 + 0.3 * (1.0 / 1.5);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0f32, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_handles_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn context_relevance_clamps_to_one() {
        assert_eq!(context_relevance(10, true), 1.0);
    }

    #[test]
    fn context_relevance_combines_session_and_workflow_bonus() {
        assert!((context_relevance(1, true) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn combined_score_rewards_the_stronger_axis() {
        // sigma dominant
        let a = combined_score(0.9, 0.1);
        // tau dominant, same product
        let b = combined_score(0.1, 0.9);
        assert!((a - b).abs() < 1e-9);
        assert!((a - (0.9 * 0.1) * 0.9).abs() < 1e-9);
    }
}
