use crate::calculations::fields::FieldResolver;
use crate::calculations::link::LinkPhase;
use crate::calculations::propagation::{Propagation, PropagationOptions};
use crate::config::ResolverConfig;
use crate::dependency::{Dependency, DependencyTarget, RelationKind};
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::{Task, TaskId, TaskSpec};
use crate::timeline::TaskView;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE: AtomicU64 = AtomicU64::new(1);

/// Owns every task of a schedule and the parent/child structure between them.
///
/// Tasks are only ever added; a whole tree is discarded at once.
#[derive(Debug, Clone)]
pub struct TaskTree {
    tree: u64,
    tasks: Vec<Task>,
    roots: Vec<TaskId>,
}

impl Default for TaskTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTree {
    pub fn new() -> Self {
        Self {
            tree: NEXT_TREE.fetch_add(1, Ordering::Relaxed),
            tasks: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Top-level tasks in insertion (or sorted) order.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<TaskId> {
        &mut self.roots
    }

    /// Every task handle, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.tasks.len()).map(|index| TaskId {
            tree: self.tree,
            index,
        })
    }

    pub fn contains(&self, id: TaskId) -> bool {
        id.tree == self.tree && id.index < self.tasks.len()
    }

    pub fn task(&self, id: TaskId) -> ScheduleResult<&Task> {
        if self.contains(id) {
            Ok(&self.tasks[id.index])
        } else {
            Err(ScheduleError::TypeMismatch { handle: id })
        }
    }

    pub fn task_mut(&mut self, id: TaskId) -> ScheduleResult<&mut Task> {
        if self.contains(id) {
            Ok(&mut self.tasks[id.index])
        } else {
            Err(ScheduleError::TypeMismatch { handle: id })
        }
    }

    /// Read-only view with effective (resolved) times.
    pub fn view(&self, id: TaskId) -> ScheduleResult<TaskView<'_>> {
        self.task(id)?;
        Ok(TaskView::new(self, id))
    }

    /// Internal access for handles that were produced by this tree.
    pub(crate) fn node(&self, id: TaskId) -> &Task {
        &self.tasks[id.index]
    }

    pub(crate) fn node_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.index]
    }

    /// Stores `task` with fresh structural links and returns its handle.
    fn insert(&mut self, mut task: Task, parent: Option<TaskId>) -> TaskId {
        task.parent = parent;
        task.children.clear();
        let id = TaskId {
            tree: self.tree,
            index: self.tasks.len(),
        };
        self.tasks.push(task);
        match parent {
            Some(parent) => self.node_mut(parent).children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Appends a top-level task.
    ///
    /// Any children or dependencies carried by a task cloned out of a tree are
    /// dropped; links are attached through the tree.
    pub fn add_root(&mut self, mut task: Task) -> TaskId {
        task.dependencies.clear();
        self.insert(task, None)
    }

    /// Appends `task` as the last child of `parent`.
    pub fn add_child(&mut self, parent: TaskId, mut task: Task) -> ScheduleResult<TaskId> {
        self.task(parent)?;
        task.dependencies.clear();
        Ok(self.insert(task, Some(parent)))
    }

    /// Appends a dependency to `task`, optionally propagating right away.
    pub fn add_dependency(&mut self, task: TaskId, dependency: Dependency, resolve: bool) -> ScheduleResult<()> {
        self.task(task)?;
        if let DependencyTarget::Task(target) = dependency.target() {
            self.task(*target)?;
        }
        self.node_mut(task).dependencies.push(dependency);
        if resolve {
            self.update_from_dependencies(task, PropagationOptions::default())?;
        }
        Ok(())
    }

    /// Shorthand for `add_dependency(task, Dependency::new(target, kind), true)`.
    pub fn depend_on(&mut self, task: TaskId, target: TaskId, kind: RelationKind) -> ScheduleResult<()> {
        self.add_dependency(task, Dependency::new(target, kind), true)
    }

    /// Builds a task and its nested children from a record. Dependencies are
    /// attached as name references and must go through the link phase.
    pub fn insert_spec(&mut self, parent: Option<TaskId>, spec: &TaskSpec) -> ScheduleResult<TaskId> {
        if let Some(parent) = parent {
            self.task(parent)?;
        }
        let mut task = spec.to_task()?;
        for dependency in &spec.dependencies {
            let kind: RelationKind = dependency.kind.parse()?;
            task.dependencies.push(Dependency::named(dependency.task.clone(), kind));
        }
        let id = self.insert(task, parent);
        for child in &spec.children {
            self.insert_spec(Some(id), child)?;
        }
        Ok(id)
    }

    /// Link phase over `tasks` and their descendants, followed by one
    /// unverified propagation pass per input task.
    pub fn load_dependencies(&mut self, tasks: &[TaskId], config: &ResolverConfig) -> ScheduleResult<()> {
        LinkPhase::new(self, config).execute(tasks)
    }

    pub fn verify(&self, task: TaskId) -> ScheduleResult<()> {
        FieldResolver::new(self).verify(task)
    }

    /// Runs one propagation pass rooted at `task`.
    pub fn update_from_dependencies(&mut self, task: TaskId, options: PropagationOptions) -> ScheduleResult<()> {
        Propagation::new(self).run(task, options)
    }

    /// `task` followed by all of its descendants, depth first.
    pub fn descendants(&self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        self.task(task)?;
        let mut out = Vec::new();
        let mut stack = vec![task];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        Ok(out)
    }

    /// First task, depth first from the roots, whose id or name equals `key`.
    pub fn find(&self, key: &str) -> Option<TaskId> {
        self.roots
            .iter()
            .filter_map(|root| self.descendants(*root).ok())
            .flatten()
            .find(|id| {
                let task = self.node(*id);
                task.id.as_deref() == Some(key) || task.name == key
            })
    }
}
