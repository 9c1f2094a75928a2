//! Structural validation and placement order
//!
//! Everything here is checked from names and mates alone, before any
//! geometry is built.

use std::collections::VecDeque;

use super::{Child, DefaultPlacement, StructureError};
use crate::constraint::Constraint;

/// Order in which an assembly's children get placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    /// Child indices, every dependency before its dependents
    pub order: Vec<usize>,
    /// Index of the constraint placing each child, by child index
    pub placing: Vec<Option<usize>>,
}

pub(crate) fn plan(
    children: &[Child],
    constraints: &[Constraint],
    policy: DefaultPlacement,
) -> Result<Plan, StructureError> {
    let lookup = |name: &str| children.iter().position(|c| c.name == name);
    let unresolved = |constraint: &Constraint, reference: String| StructureError::UnresolvedConstraint {
        constraint: constraint.to_string(),
        reference,
    };

    let n = children.len();
    let mut placing: Vec<Option<usize>> = vec![None; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree: Vec<usize> = vec![0; n];

    for (ci, constraint) in constraints.iter().enumerate() {
        let target_ref = constraint.target();
        let target = lookup(&target_ref.component)
            .ok_or_else(|| unresolved(constraint, target_ref.component.clone()))?;
        if !children[target].component.has_mate(target_ref.mate_name()) {
            return Err(unresolved(constraint, target_ref.to_string()));
        }

        let source = match constraint {
            Constraint::Fixed { .. } => None,
            Constraint::Coincident { to, .. } => {
                let source = lookup(&to.component).ok_or_else(|| unresolved(constraint, to.component.clone()))?;
                if !children[source].component.has_mate(to.mate_name()) {
                    return Err(unresolved(constraint, to.to_string()));
                }
                Some(source)
            }
            Constraint::OnFace { to, .. } => {
                Some(lookup(to).ok_or_else(|| unresolved(constraint, to.clone()))?)
            }
        };

        if source == Some(target) {
            let name = children[target].name.clone();
            return Err(StructureError::ConstraintCycle {
                cycle: vec![name.clone(), name],
            });
        }
        if placing[target].is_some() {
            return Err(StructureError::DuplicateConstraint {
                target: children[target].name.clone(),
            });
        }
        placing[target] = Some(ci);
        if let Some(source) = source {
            adjacency[source].push(target);
            indegree[target] += 1;
        }
    }

    if policy == DefaultPlacement::Explicit
        && let Some(free) = placing.iter().position(Option::is_none)
    {
        return Err(StructureError::UnconstrainedComponent(children[free].name.clone()));
    }

    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
    }

    // Kahn's algorithm; ties broken by insertion order
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &adjacency[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < n {
        let cycle = find_cycle(&adjacency)
            .unwrap_or_default()
            .into_iter()
            .map(|i| children[i].name.clone())
            .collect();
        return Err(StructureError::ConstraintCycle { cycle });
    }

    Ok(Plan { order, placing })
}

fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Visit {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(node: usize, adjacency: &[Vec<usize>], state: &mut [Visit], stack: &mut Vec<usize>) -> Option<Vec<usize>> {
        state[node] = Visit::Visiting;
        stack.push(node);
        for &next in &adjacency[node] {
            match state[next] {
                Visit::Unvisited => {
                    if let Some(cycle) = dfs(next, adjacency, state, stack) {
                        return Some(cycle);
                    }
                }
                Visit::Visiting => {
                    let start = stack.iter().position(|&n| n == next)?;
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Visit::Visited => {}
            }
        }
        stack.pop();
        state[node] = Visit::Visited;
        None
    }

    let mut state = vec![Visit::Unvisited; adjacency.len()];
    for node in 0..adjacency.len() {
        if state[node] == Visit::Unvisited {
            let mut stack = Vec::new();
            if let Some(cycle) = dfs(node, adjacency, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}
