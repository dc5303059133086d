//! Dependency validation and execution ordering.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::{Result, StepgateError};
use crate::registry::{Registry, Step};

/// The validated, deterministic order in which steps run.
///
/// Every step appears after all the steps it requires. Among steps with no
/// ordering constraint between them, the earlier-registered step runs first,
/// so rebuilding from an unchanged registry always yields the same plan.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Steps in execution order.
    steps: Vec<Step>,
    /// Map of step id to its position in `steps`.
    positions: HashMap<String, usize>,
    /// Map of step id to steps that directly depend on it.
    dependents: HashMap<String, Vec<String>>,
}

impl ExecutionPlan {
    /// Build a plan from every step in the registry.
    pub fn from_registry(registry: &Registry) -> Result<Self> {
        Self::build(registry.all())
    }

    /// Validate `steps` and order them.
    ///
    /// # Errors
    ///
    /// - `DuplicateId` if two steps share an id
    /// - `UnknownDependency` for the first requirement naming no step
    /// - `CyclicDependency` with the ids on the first cycle found
    pub fn build(steps: &[Step]) -> Result<Self> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            if index.insert(step.id(), i).is_some() {
                return Err(StepgateError::DuplicateId {
                    id: step.id().to_string(),
                });
            }
        }

        // Direct dependencies by registration index, deduplicated
        let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(steps.len());
        for step in steps {
            let mut seen = HashSet::new();
            let mut deps = Vec::new();
            for dep in step.dependencies() {
                let Some(&d) = index.get(dep.as_str()) else {
                    return Err(StepgateError::UnknownDependency {
                        step: step.id().to_string(),
                        missing: dep.clone(),
                    });
                };
                if seen.insert(d) {
                    deps.push(d);
                }
            }
            dependencies.push(deps);
        }

        if let Some(cycle) = find_cycle(steps, &dependencies) {
            return Err(StepgateError::CyclicDependency { cycle });
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
        for (i, deps) in dependencies.iter().enumerate() {
            for &d in deps {
                dependents[d].push(i);
            }
        }

        // Kahn's algorithm; the min-heap keeps registration order among ready steps
        let mut in_degree: Vec<usize> = dependencies.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(steps.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        let ordered: Vec<Step> = order.iter().map(|&i| steps[i].clone()).collect();
        let positions = ordered
            .iter()
            .enumerate()
            .map(|(pos, step)| (step.id().to_string(), pos))
            .collect();
        let dependents = dependents
            .iter()
            .enumerate()
            .map(|(i, ds)| {
                (
                    steps[i].id().to_string(),
                    ds.iter().map(|&d| steps[d].id().to_string()).collect(),
                )
            })
            .collect();

        tracing::debug!(steps = ordered.len(), "built execution plan");

        Ok(Self {
            steps: ordered,
            positions,
            dependents,
        })
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step ids in execution order.
    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(Step::id).collect()
    }

    /// Position of a step in the execution order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Get the declared dependencies of a step.
    pub fn dependencies_of(&self, id: &str) -> Option<&[String]> {
        self.position(id).map(|pos| self.steps[pos].dependencies())
    }

    /// Get all transitive dependents of a step.
    ///
    /// Returns steps that depend on the given step, directly or indirectly.
    pub fn transitive_dependents(&self, id: &str) -> HashSet<String> {
        let mut result = HashSet::new();
        let mut to_visit = vec![id.to_string()];

        while let Some(current) = to_visit.pop() {
            if let Some(dependents) = self.dependents.get(&current) {
                for dep in dependents {
                    if result.insert(dep.clone()) {
                        to_visit.push(dep.clone());
                    }
                }
            }
        }

        result
    }

    /// Get the number of steps in the plan.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Find a cycle, returning its path with the first id repeated at the end.
///
/// Steps are visited in registration order and dependencies in declaration
/// order, so the reported cycle is stable.
fn find_cycle(steps: &[Step], dependencies: &[Vec<usize>]) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(
        node: usize,
        dependencies: &[Vec<usize>],
        state: &mut [State],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state[node] = State::Visiting;
        path.push(node);

        for &dep in &dependencies[node] {
            match state[dep] {
                State::Visiting => {
                    let start = path.iter().position(|&n| n == dep)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                State::Unvisited => {
                    if let Some(cycle) = dfs(dep, dependencies, state, path) {
                        return Some(cycle);
                    }
                }
                State::Visited => {}
            }
        }

        path.pop();
        state[node] = State::Visited;
        None
    }

    let mut state = vec![State::Unvisited; steps.len()];
    let mut path = Vec::new();

    for node in 0..steps.len() {
        if state[node] == State::Unvisited {
            if let Some(cycle) = dfs(node, dependencies, &mut state, &mut path) {
                return Some(
                    cycle
                        .into_iter()
                        .map(|i| steps[i].id().to_string())
                        .collect(),
                );
            }
        }
    }

    None
}
