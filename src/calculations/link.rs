use crate::calculations::propagation::{Propagation, PropagationOptions};
use crate::config::{DuplicateKeyPolicy, ResolverConfig};
use crate::dependency::DependencyTarget;
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::TaskId;
use crate::tree::TaskTree;
use std::collections::{HashMap, HashSet};
use std::collections::hash_map::Entry;
use tracing::{info, warn};

/// Replaces name/id dependency references with live task handles, then runs
/// one unverified propagation pass over each input task.
pub struct LinkPhase<'a> {
    tree: &'a mut TaskTree,
    config: &'a ResolverConfig,
}

impl<'a> LinkPhase<'a> {
    pub fn new(tree: &'a mut TaskTree, config: &'a ResolverConfig) -> Self {
        Self { tree, config }
    }

    pub fn execute(&mut self, tasks: &[TaskId]) -> ScheduleResult<()> {
        let working_set = self.working_set(tasks)?;
        let lookup = self.build_lookup(&working_set)?;

        // All references resolve before any is rewritten.
        let mut links = Vec::new();
        for &id in &working_set {
            let task = self.tree.node(id);
            for (slot, dependency) in task.dependencies().iter().enumerate() {
                let DependencyTarget::Named(reference) = dependency.target() else {
                    continue;
                };
                let target = *lookup
                    .get(reference.as_str())
                    .ok_or_else(|| ScheduleError::DependencyNotFound {
                        task: task.name.clone(),
                        reference: reference.clone(),
                    })?;
                links.push((id, slot, target));
            }
        }
        for &(id, slot, target) in &links {
            self.tree.node_mut(id).dependencies[slot].link(target);
        }
        info!(tasks = working_set.len(), linked = links.len(), "linked dependencies");

        let mut propagation = Propagation::new(self.tree);
        for &task in tasks {
            propagation.run(task, PropagationOptions::default())?;
        }
        Ok(())
    }

    /// The input tasks plus all of their descendants, without repeats.
    fn working_set(&self, tasks: &[TaskId]) -> ScheduleResult<Vec<TaskId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &task in tasks {
            for id in self.tree.descendants(task)? {
                if seen.insert(id) {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }

    fn build_lookup(&self, working_set: &[TaskId]) -> ScheduleResult<HashMap<String, TaskId>> {
        let mut lookup = HashMap::with_capacity(working_set.len());
        for &id in working_set {
            let key = self.tree.node(id).lookup_key();
            match lookup.entry(key.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
                Entry::Occupied(_) => match self.config.duplicate_keys {
                    DuplicateKeyPolicy::Reject => {
                        return Err(ScheduleError::DuplicateTaskKey { key: key.to_string() });
                    }
                    DuplicateKeyPolicy::FirstMatch => {
                        warn!(key, "duplicate task key, keeping the first task");
                    }
                },
            }
        }
        Ok(lookup)
    }
}
