use crate::calculations::fields::{FieldResolver, rounded_mean};
use crate::calculations::link::LinkPhase;
use crate::calculations::propagation::PropagationOptions;
use crate::config::ResolverConfig;
use crate::error::ScheduleResult;
use crate::task::{Task, TaskId, TaskSpec};
use crate::time::{self, Instant, TimeSpan};
use crate::timeline::{TaskView, Timeline};
use crate::tree::TaskTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
        }
    }
}

/// A set of top-level tasks plus metadata: the unit handed to exporters.
///
/// The schedule owns a [`TaskTree`]; its own start and end are aggregated
/// from the top-level tasks rather than stored.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    metadata: ScheduleMetadata,
    tree: TaskTree,
    config: ResolverConfig,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_metadata(metadata: ScheduleMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn from_tree(metadata: ScheduleMetadata, tree: TaskTree) -> Self {
        Self {
            metadata,
            tree,
            config: ResolverConfig::default(),
        }
    }

    /// Builds the tree from records, links dependencies by id/name and runs
    /// one propagation pass. Every task is verified afterwards when
    /// `config.verify_after_link` is set.
    pub fn from_specs(
        metadata: ScheduleMetadata,
        specs: &[TaskSpec],
        config: ResolverConfig,
    ) -> ScheduleResult<Self> {
        let mut tree = TaskTree::new();
        let mut roots = Vec::with_capacity(specs.len());
        for spec in specs {
            roots.push(tree.insert_spec(None, spec)?);
        }
        tree.load_dependencies(&roots, &config)?;
        let schedule = Self {
            metadata,
            tree,
            config,
        };
        if schedule.config.verify_after_link {
            schedule.verify_all()?;
        }
        debug!(
            project = %schedule.metadata.project_name,
            tasks = schedule.tree.len(),
            "schedule loaded from records"
        );
        Ok(schedule)
    }

    pub fn metadata(&self) -> &ScheduleMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ScheduleMetadata) {
        self.metadata = metadata;
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResolverConfig) {
        self.config = config;
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TaskTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> TaskTree {
        self.tree
    }

    pub fn tasks(&self) -> &[TaskId] {
        self.tree.roots()
    }

    pub fn add_task(&mut self, task: Task) -> TaskId {
        self.tree.add_root(task)
    }

    pub fn view(&self, id: TaskId) -> ScheduleResult<TaskView<'_>> {
        self.tree.view(id)
    }

    /// Looks a task up by id, falling back to name.
    pub fn find(&self, key: &str) -> Option<TaskView<'_>> {
        self.tree.find(key).map(|id| TaskView::new(&self.tree, id))
    }

    /// Runs the link phase over all top-level tasks with this schedule's config.
    pub fn load_dependencies(&mut self) -> ScheduleResult<()> {
        let roots = self.tree.roots().to_vec();
        LinkPhase::new(&mut self.tree, &self.config).execute(&roots)
    }

    /// One propagation pass over every top-level task, in order.
    pub fn update_from_dependencies(&mut self, options: PropagationOptions) -> ScheduleResult<()> {
        let roots = self.tree.roots().to_vec();
        for root in roots {
            self.tree.update_from_dependencies(root, options)?;
        }
        Ok(())
    }

    /// Verifies every task in the tree, depth first from the top-level tasks.
    pub fn verify_all(&self) -> ScheduleResult<()> {
        let fields = FieldResolver::new(&self.tree);
        for root in self.tree.roots() {
            for id in self.tree.descendants(*root)? {
                fields.verify(id)?;
            }
        }
        Ok(())
    }

    /// Orders top-level tasks by start, ties broken by end. With `verify`,
    /// each top-level task must pass verification first.
    pub fn sort_tasks(&mut self, verify: bool) -> ScheduleResult<()> {
        let fields = FieldResolver::new(&self.tree);
        if verify {
            for root in self.tree.roots() {
                fields.verify(*root)?;
            }
        }
        let mut keyed: Vec<(Option<Instant>, Option<Instant>, TaskId)> = self
            .tree
            .roots()
            .iter()
            .map(|id| (fields.start(*id, true), fields.end(*id, true), *id))
            .collect();
        keyed.sort_by_key(|(start, end, _)| (*start, *end));
        *self.tree.roots_mut() = keyed.into_iter().map(|(_, _, id)| id).collect();
        Ok(())
    }

    /// Tasks `level` steps below the top level (0 = the top-level tasks).
    pub fn tasks_at_level(&self, level: usize) -> Vec<TaskView<'_>> {
        let mut current = self.root_views();
        for _ in 0..level {
            current = current.iter().flat_map(TaskView::child_views).collect();
        }
        current
    }

    fn root_views(&self) -> Vec<TaskView<'_>> {
        self.tree
            .roots()
            .iter()
            .map(|id| TaskView::new(&self.tree, *id))
            .collect()
    }
}

impl Timeline for Schedule {
    fn name(&self) -> &str {
        &self.metadata.project_name
    }

    fn nickname(&self) -> &str {
        &self.metadata.project_name
    }

    fn start(&self) -> Option<Instant> {
        self.root_views().iter().filter_map(Timeline::start).min()
    }

    fn end(&self) -> Option<Instant> {
        self.root_views().iter().filter_map(Timeline::end).max()
    }

    fn duration(&self) -> Option<TimeSpan> {
        Some(time::subtract(self.end()?, self.start()?))
    }

    fn percent(&self) -> Option<u8> {
        rounded_mean(self.root_views().iter().filter_map(Timeline::percent))
    }

    fn children(&self) -> Vec<TaskView<'_>> {
        self.root_views()
    }

    /// Top-level tasks at depth 0, each followed by its descendants.
    fn flatten_with_levels(&self) -> (Vec<TaskView<'_>>, Vec<usize>) {
        let mut views = Vec::new();
        let mut levels = Vec::new();
        for root in self.root_views() {
            root.collect_levels(0, &mut views, &mut levels);
        }
        (views, levels)
    }
}
