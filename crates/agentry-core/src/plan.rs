//! Plan validation and plan file loading.
//!
//! The plan supplier validates here before the engine ever sees a plan:
//! unique step ids, resolvable dependencies, known capabilities with valid
//! parameters, and an acyclic dependency relation. The engine assumes this
//! pre-validation but still performs its own cycle detection as a safety
//! net.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use agentry_types::plan::Plan;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use thiserror::Error;

use crate::tool::ToolRegistry;

// ---------------------------------------------------------------------------
// PlanError
// ---------------------------------------------------------------------------

/// Errors from plan validation or plan file loading.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan must contain at least one step")]
    Empty,

    #[error("duplicate step id: '{0}'")]
    DuplicateStepId(String),

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("circular dependency detected involving step '{0}'")]
    Cycle(String),

    #[error("step '{step}' uses unknown capability '{capability}'")]
    UnknownCapability { step: String, capability: String },

    #[error("invalid parameters for step '{step}' ({capability}): {message}")]
    InvalidParameters {
        step: String,
        capability: String,
        message: String,
    },

    #[error("failed to parse plan file: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that `plan` is executable against `registry`.
///
/// Checks, in order: at least one step, unique step ids, resolvable
/// dependency ids, known capabilities with parameter maps that satisfy
/// their declarations, and an acyclic dependency relation.
pub fn validate_plan(plan: &Plan, registry: &ToolRegistry) -> Result<(), PlanError> {
    if plan.steps.is_empty() {
        return Err(PlanError::Empty);
    }

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if !seen.insert(step.id.as_str()) {
            return Err(PlanError::DuplicateStepId(step.id.clone()));
        }
    }

    for step in &plan.steps {
        for dep in &step.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(PlanError::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    for step in &plan.steps {
        let Some(capability) = registry.capability(&step.capability) else {
            return Err(PlanError::UnknownCapability {
                step: step.id.clone(),
                capability: step.capability.clone(),
            });
        };
        capability
            .validate(&step.parameters)
            .map_err(|message| PlanError::InvalidParameters {
                step: step.id.clone(),
                capability: step.capability.clone(),
                message,
            })?;
    }

    validate_dag(plan)
}

/// Acyclicity safety net over the dependency relation.
///
/// Builds a petgraph `DiGraph` with one node per step and one edge per
/// dependency, then topologically sorts it; a sort failure names a step on
/// the cycle.
fn validate_dag(plan: &Plan) -> Result<(), PlanError> {
    let index: HashMap<&str, usize> = plan
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    let mut graph = DiGraph::<&str, ()>::new();
    let nodes: Vec<_> = plan
        .steps
        .iter()
        .map(|s| graph.add_node(s.id.as_str()))
        .collect();

    for (to, step) in plan.steps.iter().enumerate() {
        for dep in &step.depends_on {
            // Unresolvable ids were rejected above.
            if let Some(&from) = index.get(dep.as_str()) {
                graph.add_edge(nodes[from], nodes[to], ());
            }
        }
    }

    toposort(&graph, None)
        .map_err(|cycle| PlanError::Cycle(graph[cycle.node_id()].to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Plan files
// ---------------------------------------------------------------------------

/// Load a plan from a YAML or JSON file.
///
/// `.json` files are parsed as JSON; everything else as YAML (which accepts
/// JSON as a subset). The plan is not validated here -- callers validate
/// against their registry.
pub fn load_plan_file(path: &Path) -> Result<Plan, PlanError> {
    let raw = std::fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).map_err(|e| PlanError::Parse(e.to_string()))
    } else {
        serde_yaml_ng::from_str(&raw).map_err(|e| PlanError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use agentry_types::outcome::StepResult;
    use agentry_types::plan::Step;
    use agentry_types::tool::{ParameterKind, ToolCapability, ToolError, ToolParameter};
    use serde_json::{Value, json};

    use crate::engine::runner::Invocation;
    use crate::tool::Tool;

    struct StubTool {
        capabilities: Vec<ToolCapability>,
    }

    impl StubTool {
        fn new() -> Self {
            Self {
                capabilities: vec![
                    ToolCapability::new("fetch", "fetch something").with_parameters(vec![
                        ToolParameter::required("url", ParameterKind::String, "target url"),
                    ]),
                    ToolCapability::new("summarize", "summarize data"),
                ],
            }
        }
    }

    impl Tool for StubTool {
        fn name(&self) -> &str {
            "stub"
        }

        fn description(&self) -> &str {
            "stub tool"
        }

        fn capabilities(&self) -> &[ToolCapability] {
            &self.capabilities
        }

        async fn execute(
            &self,
            _capability: &str,
            _parameters: &serde_json::Map<String, Value>,
            _invocation: &Invocation<'_>,
        ) -> Result<StepResult, ToolError> {
            Ok(StepResult::success(json!({})))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(StubTool::new());
        registry
    }

    fn step(id: &str, capability: &str, params: Value, depends_on: Vec<&str>) -> Step {
        Step {
            id: id.to_string(),
            capability: capability.to_string(),
            parameters: params.as_object().cloned().unwrap_or_default(),
            description: format!("step {id}"),
            depends_on: depends_on.into_iter().map(String::from).collect(),
            optional: false,
        }
    }

    fn plan(steps: Vec<Step>) -> Plan {
        Plan {
            id: uuid::Uuid::now_v7(),
            task_description: "validation test".to_string(),
            steps,
            estimated_complexity: None,
            required_tools: vec![],
            success_criteria: vec![],
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        let plan = plan(vec![
            step("a", "fetch", json!({"url": "https://x"}), vec![]),
            step("b", "summarize", json!({}), vec!["a"]),
        ]);
        assert!(validate_plan(&plan, &registry()).is_ok());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = plan(vec![]);
        assert!(matches!(
            validate_plan(&plan, &registry()),
            Err(PlanError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let plan = plan(vec![
            step("a", "summarize", json!({}), vec![]),
            step("a", "summarize", json!({}), vec![]),
        ]);
        assert!(matches!(
            validate_plan(&plan, &registry()),
            Err(PlanError::DuplicateStepId(ref id)) if id == "a"
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let plan = plan(vec![step("a", "summarize", json!({}), vec!["ghost"])]);
        assert!(matches!(
            validate_plan(&plan, &registry()),
            Err(PlanError::UnknownDependency { ref dependency, .. }) if dependency == "ghost"
        ));
    }

    #[test]
    fn test_unknown_capability_rejected() {
        let plan = plan(vec![step("a", "teleport", json!({}), vec![])]);
        assert!(matches!(
            validate_plan(&plan, &registry()),
            Err(PlanError::UnknownCapability { ref capability, .. }) if capability == "teleport"
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        // "fetch" requires a string url.
        let plan = plan(vec![step("a", "fetch", json!({"url": 7}), vec![])]);
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameters { .. }));
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_cycle_rejected() {
        let plan = plan(vec![
            step("a", "summarize", json!({}), vec!["b"]),
            step("b", "summarize", json!({}), vec!["a"]),
        ]);
        assert!(matches!(
            validate_plan(&plan, &registry()),
            Err(PlanError::Cycle(_))
        ));
    }

    #[test]
    fn test_load_plan_yaml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
task_description: "check the weather"
steps:
  - id: fetch
    capability: fetch
    description: "fetch forecast"
    parameters:
      url: "https://example.org"
"#
        )
        .unwrap();

        let plan = load_plan_file(file.path()).unwrap();
        assert_eq!(plan.task_description, "check the weather");
        assert_eq!(plan.steps.len(), 1);
        assert!(!plan.id.is_nil(), "missing id is generated on load");
    }

    #[test]
    fn test_load_plan_json_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"{{"task_description": "t", "steps": [{{"id": "a", "capability": "summarize", "description": "d"}}]}}"#
        )
        .unwrap();

        let plan = load_plan_file(file.path()).unwrap();
        assert_eq!(plan.steps[0].capability, "summarize");
    }

    #[test]
    fn test_load_plan_bad_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_plan_file(file.path()),
            Err(PlanError::Parse(_))
        ));
    }
}
