use crate::calculations::fields::FieldResolver;
use crate::dependency::PartialConstraint;
use crate::error::ScheduleResult;
use crate::task::TaskId;
use crate::time::format_instant;
use crate::tree::TaskTree;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOptions {
    /// Recurse into children between the two evaluations of a task.
    pub update_children: bool,
    /// Verify the task the pass was started on once it completes.
    pub verify: bool,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            update_children: true,
            verify: false,
        }
    }
}

impl PropagationOptions {
    pub fn verified() -> Self {
        Self {
            verify: true,
            ..Self::default()
        }
    }

    pub fn shallow() -> Self {
        Self {
            update_children: false,
            verify: false,
        }
    }
}

/// One propagation pass over a subtree.
///
/// Each task has its dependencies applied before and again after its
/// children are updated, so one pass covers a child depending on its parent
/// as well as a parent depending on a child. Longer chains of indirect
/// coupling need further passes; the pass never loops to a fixed point.
pub struct Propagation<'a> {
    tree: &'a mut TaskTree,
}

impl<'a> Propagation<'a> {
    pub fn new(tree: &'a mut TaskTree) -> Self {
        Self { tree }
    }

    pub fn run(&mut self, task: TaskId, options: PropagationOptions) -> ScheduleResult<()> {
        self.tree.task(task)?;
        self.update(task, options.update_children)?;
        if options.verify {
            FieldResolver::new(self.tree).verify(task)?;
        }
        Ok(())
    }

    fn update(&mut self, task: TaskId, update_children: bool) -> ScheduleResult<()> {
        self.apply_dependencies(task)?;
        if update_children {
            let children = self.tree.node(task).children().to_vec();
            for child in children {
                self.update(child, true)?;
            }
        }
        self.apply_dependencies(task)
    }

    /// Merges every dependency of `task` in list order and writes the result
    /// into its stored start/end.
    fn apply_dependencies(&mut self, task: TaskId) -> ScheduleResult<()> {
        let pending = self.evaluate(task)?;
        let node = self.tree.node_mut(task);
        if let Some(start) = pending.start {
            debug!(task = %node.name, start = %format_instant(start), "applied dependency start");
            node.start = Some(start);
        }
        if let Some(end) = pending.end {
            debug!(task = %node.name, end = %format_instant(end), "applied dependency end");
            node.end = Some(end);
        }
        Ok(())
    }

    fn evaluate(&self, task: TaskId) -> ScheduleResult<PartialConstraint> {
        let node = self.tree.node(task);
        let mut pending = PartialConstraint::default();
        for dependency in node.dependencies() {
            let constraint = dependency
                .resolve(self.tree)
                .map_err(|err| err.for_task(&node.name))?;
            if constraint.is_empty() {
                debug!(task = %node.name, kind = %dependency.kind(), "dependency target not resolved yet, deferred");
            }
            pending.merge(constraint);
        }
        Ok(pending)
    }
}
