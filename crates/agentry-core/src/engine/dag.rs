//! Deterministic topological ordering of plan steps.
//!
//! Depth-first traversal with three-state marking (unvisited, in-progress,
//! finished). Revisiting an in-progress step means the dependency relation
//! has a cycle; ordering aborts immediately with no partial result. Steps
//! are visited in declaration order and dependencies in declared order, so
//! independent steps keep their relative input order and identical plans
//! always produce identical orderings.

use std::collections::HashMap;

use agentry_types::plan::Step;

use super::EngineError;

/// Visit state for the depth-first traversal.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Finished,
}

/// Order `steps` so every step appears after all of its dependencies.
///
/// Fails with [`EngineError::CycleDetected`] naming a step on the cycle, or
/// [`EngineError::UnknownDependency`] when a dependency id does not resolve.
/// Either failure pre-empts execution entirely: no step runs if the graph is
/// invalid.
pub fn topological_order(steps: &[Step]) -> Result<Vec<&Step>, EngineError> {
    let index: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    let mut marks = vec![Mark::Unvisited; steps.len()];
    let mut ordered = Vec::with_capacity(steps.len());

    for i in 0..steps.len() {
        visit(i, steps, &index, &mut marks, &mut ordered)?;
    }

    Ok(ordered)
}

fn visit<'a>(
    idx: usize,
    steps: &'a [Step],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    ordered: &mut Vec<&'a Step>,
) -> Result<(), EngineError> {
    match marks[idx] {
        Mark::Finished => return Ok(()),
        Mark::InProgress => {
            return Err(EngineError::CycleDetected(steps[idx].id.clone()));
        }
        Mark::Unvisited => {}
    }

    marks[idx] = Mark::InProgress;

    for dep in &steps[idx].depends_on {
        let dep_idx = *index
            .get(dep.as_str())
            .ok_or_else(|| EngineError::UnknownDependency {
                step: steps[idx].id.clone(),
                dependency: dep.clone(),
            })?;
        visit(dep_idx, steps, index, marks, ordered)?;
    }

    marks[idx] = Mark::Finished;
    ordered.push(&steps[idx]);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
