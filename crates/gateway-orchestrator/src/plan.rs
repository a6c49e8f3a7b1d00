//! Dependency-aware execution planning: group independent calls into
//! parallel stages while respecting a resource ceiling.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Default ceiling on stage size before a stage is split into sequential
/// single-tool stages.
pub const MAX_PARALLEL: usize = 5;

/// A single requested tool invocation, as submitted to
/// [`crate::SemanticOrchestrator::create_execution_plan`].
#[derive(Debug, Clone, Default)]
pub struct CallDescriptor {
    /// Caller-supplied id; synthesised from the ordinal index if absent.
    pub id: Option<String>,
    /// Input values for the call. A string value of the form `$id` or
    /// `$id.field` is a dependency reference on another call's output.
    pub inputs: BTreeMap<String, serde_json::Value>,
}

impl CallDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), inputs: BTreeMap::new() }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }
}

/// Ordered list of stages (each a set of call ids intended to run
/// concurrently) plus the plan's estimated total duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    pub stages: Vec<Vec<String>>,
    pub estimated_duration: Duration,
}

/// Scans each call's `inputs` for `$id` / `$id.field` references and
/// returns `call_id -> [dependency_id, ...]` in input order.
fn analyze_dependencies(calls: &[CallDescriptor]) -> (Vec<String>, HashMap<String, Vec<String>>) {
    let mut order = Vec::with_capacity(calls.len());
    let mut dependencies = HashMap::with_capacity(calls.len());

    for (index, call) in calls.iter().enumerate() {
        let call_id = call.id.clone().unwrap_or_else(|| index.to_string());
        let mut deps = Vec::new();
        for value in call.inputs.values() {
            if let serde_json::Value::String(s) = value {
                if let Some(reference) = s.strip_prefix('$') {
                    let dep_id = reference.split('.').next().unwrap_or(reference);
                    deps.push(dep_id.to_string());
                }
            }
        }
        order.push(call_id.clone());
        dependencies.insert(call_id, deps);
    }

    (order, dependencies)
}

/// Assigns each call a stage index equal to `1 + max(stage index of each of
/// its transitive dependencies)`, or `0` if it has none (a dependency
/// reference to an id outside the call set is inert, same as the original
/// scan). This groups every call as early as the full dependency chain
/// allows — independent calls all land at index 0 and share a stage — while
/// guaranteeing a dependency's stage index is always strictly less than
/// every transitive dependent's, however deep the chain runs. Cyclic
/// references (a call depending, directly or transitively, on itself) are
/// broken by treating the cycle-closing edge as inert rather than
/// recursing forever.
fn find_parallel_groups(order: &[String], dependencies: &HashMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut stage_index_of: HashMap<String, usize> = HashMap::with_capacity(order.len());

    fn resolve(
        call_id: &str,
        dependencies: &HashMap<String, Vec<String>>,
        stage_index_of: &mut HashMap<String, usize>,
        in_progress: &mut std::collections::HashSet<String>,
    ) -> usize {
        if let Some(&index) = stage_index_of.get(call_id) {
            return index;
        }
        if !in_progress.insert(call_id.to_string()) {
            // Cycle: treat as having no (further) dependencies.
            return 0;
        }

        let deps = dependencies.get(call_id);
        let index = match deps {
            Some(deps) if !deps.is_empty() => deps
                .iter()
                .filter(|dep| dependencies.contains_key(dep.as_str()))
                .map(|dep| resolve(dep, dependencies, stage_index_of, in_progress))
                .max()
                .map(|max_dep_index| max_dep_index + 1)
                .unwrap_or(0),
            _ => 0,
        };

        in_progress.remove(call_id);
        stage_index_of.insert(call_id.to_string(), index);
        index
    }

    let mut in_progress = std::collections::HashSet::new();
    for call_id in order {
        resolve(call_id, dependencies, &mut stage_index_of, &mut in_progress);
    }

    let stage_count = stage_index_of.values().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut groups: Vec<Vec<String>> = vec![Vec::new(); stage_count];
    for call_id in order {
        let index = stage_index_of[call_id];
        groups[index].push(call_id.clone());
    }

    groups
}

/// Splits any group larger than `MAX_PARALLEL` into sequential
/// single-element stages (in input order), keeping smaller groups intact
/// as a single parallel stage.
fn apply_resource_check(groups: Vec<Vec<String>>, max_parallel: usize) -> Vec<Vec<String>> {
    let mut stages = Vec::with_capacity(groups.len());
    for group in groups {
        if group.len() <= max_parallel {
            stages.push(group);
        } else {
            for call_id in group {
                stages.push(vec![call_id]);
            }
        }
    }
    stages
}

/// Builds the plan's stages from a raw call-descriptor list, without
/// estimating duration (duration needs a history lookup the planner itself
/// has no access to — see [`crate::SemanticOrchestrator::create_execution_plan`]).
pub(crate) fn plan_stages(calls: &[CallDescriptor], max_parallel: usize) -> Vec<Vec<String>> {
    let (order, dependencies) = analyze_dependencies(calls);
    let groups = find_parallel_groups(&order, &dependencies);
    apply_resource_check(groups, max_parallel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, deps: &[(&str, &str)]) -> CallDescriptor {
        let mut c = CallDescriptor::new(id);
        for (key, value) in deps {
            c = c.with_input(*key, serde_json::Value::String((*value).to_string()));
        }
        c
    }

    #[test]
    fn independent_calls_land_in_one_stage() {
        let calls = vec![call("x", &[]), call("y", &[]), call("z", &[])];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(stages, vec![vec!["x".to_string(), "y".to_string(), "z".to_string()]]);
    }

    #[test]
    fn dependent_call_lands_in_a_later_stage() {
        // x, y depends on x's output, z independent.
        let calls = vec![call("x", &[]), call("y", &[("in", "$x.out")]), call("z", &[])];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(stages, vec![vec!["x".to_string(), "z".to_string()], vec!["y".to_string()]]);
    }

    #[test]
    fn oversized_group_splits_into_sequential_stages() {
        let calls: Vec<CallDescriptor> = (0..7).map(|i| call(&i.to_string(), &[])).collect();
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(stages.len(), 7);
        assert!(stages.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn missing_id_is_synthesised_from_ordinal_index() {
        let calls = vec![CallDescriptor::default(), CallDescriptor::default()];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(stages, vec![vec!["0".to_string(), "1".to_string()]]);
    }

    #[test]
    fn a_direct_dependency_precedes_its_dependent() {
        let calls = vec![call("a", &[]), call("b", &[("in", "$a")])];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        let stage_of = |id: &str| stages.iter().position(|s| s.iter().any(|x| x == id)).unwrap();
        assert!(stage_of("a") < stage_of("b"));
    }

    /// A three-link chain `a -> b -> c` must be ordered transitively: `c`'s
    /// only recorded dependency is `b`, but `b` itself depends on `a`, so
    /// `c`'s stage index must still land strictly after `b`'s (and
    /// therefore after `a`'s too), not merely after whichever group it was
    /// first compared against.
    #[test]
    fn a_three_link_chain_is_transitively_ordered() {
        let calls = vec![
            call("a", &[]),
            call("b", &[("in", "$a")]),
            call("c", &[("in", "$b")]),
        ];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(
            stages,
            vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    /// A dependency chain with an independent call alongside it: the
    /// independent call still joins the earliest stage, and the chain's
    /// transitive ordering holds regardless of how many other calls share
    /// its starting stage.
    #[test]
    fn independent_call_joins_the_earliest_stage_alongside_a_chain_root() {
        let calls = vec![
            call("a", &[]),
            call("b", &[("in", "$a")]),
            call("c", &[("in", "$b")]),
            call("z", &[]),
        ];
        let stages = plan_stages(&calls, MAX_PARALLEL);
        assert_eq!(
            stages,
            vec![vec!["a".to_string(), "z".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }
}
