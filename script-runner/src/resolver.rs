//! Dependency resolution
//!
//! Kahn's algorithm over the `depends_on` graph. Scripts with no pending
//! dependencies are released in input order, so the same input always yields
//! the same order.

use crate::{Result, RunnerError, ScriptDescriptor};
use std::collections::{HashMap, VecDeque};

/// Order `scripts` so that every dependency precedes its dependents
pub fn resolve(scripts: Vec<ScriptDescriptor>) -> Result<Vec<ScriptDescriptor>> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(scripts.len());
    for (index, script) in scripts.iter().enumerate() {
        if index_of.insert(script.id(), index).is_some() {
            return Err(RunnerError::DuplicateId(script.id().to_string()));
        }
    }

    let mut in_degree = vec![0usize; scripts.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); scripts.len()];

    for (index, script) in scripts.iter().enumerate() {
        for dependency in script.depends_on() {
            if dependency == script.id() {
                return Err(RunnerError::SelfDependency(script.id().to_string()));
            }
            let Some(&dep_index) = index_of.get(dependency.as_str()) else {
                return Err(RunnerError::MissingDependency {
                    script: script.id().to_string(),
                    dependency: dependency.clone(),
                });
            };
            in_degree[index] += 1;
            dependents[dep_index].push(index);
        }
    }

    let mut queue: VecDeque<usize> = (0..scripts.len())
        .filter(|&index| in_degree[index] == 0)
        .collect();
    let mut order = Vec::with_capacity(scripts.len());

    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &next in &dependents[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != scripts.len() {
        let stuck = scripts
            .iter()
            .enumerate()
            .filter(|&(index, _)| in_degree[index] > 0)
            .map(|(_, script)| script.id().to_string())
            .collect();
        return Err(RunnerError::CyclicDependency(stuck));
    }

    let mut slots: Vec<Option<ScriptDescriptor>> = scripts.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}
