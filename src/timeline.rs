use crate::calculations::fields::{FieldResolver, Origin, TimeField};
use crate::error::ScheduleResult;
use crate::task::{Task, TaskId};
use crate::time::{self, Instant, TimeSpan};
use crate::tree::TaskTree;

/// The read-only surface handed to exporters.
///
/// Implemented by single tasks ([`TaskView`]) and by whole schedules, so a
/// renderer can walk either the same way.
pub trait Timeline {
    fn name(&self) -> &str;

    /// Display label; falls back to [`Timeline::name`].
    fn nickname(&self) -> &str;

    fn start(&self) -> Option<Instant>;

    fn end(&self) -> Option<Instant>;

    fn duration(&self) -> Option<TimeSpan>;

    fn percent(&self) -> Option<u8>;

    fn children(&self) -> Vec<TaskView<'_>>;

    /// Depth-first linearisation with the depth of each entry.
    fn flatten_with_levels(&self) -> (Vec<TaskView<'_>>, Vec<usize>);
}

/// A task together with the tree it lives in, exposing resolved values.
#[derive(Clone, Copy)]
pub struct TaskView<'a> {
    tree: &'a TaskTree,
    id: TaskId,
}

impl<'a> TaskView<'a> {
    pub(crate) fn new(tree: &'a TaskTree, id: TaskId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task(&self) -> &'a Task {
        self.tree.node(self.id)
    }

    fn fields(&self) -> FieldResolver<'a> {
        FieldResolver::new(self.tree)
    }

    pub fn origin(&self, field: TimeField) -> Option<Origin> {
        self.fields().origin(self.id, field)
    }

    pub fn verify(&self) -> ScheduleResult<()> {
        self.fields().verify(self.id)
    }

    /// Like [`Timeline::children`] but tied to the tree's lifetime.
    pub fn child_views(&self) -> Vec<TaskView<'a>> {
        self.task()
            .children()
            .iter()
            .map(|child| TaskView::new(self.tree, *child))
            .collect()
    }

    pub(crate) fn collect_levels(&self, level: usize, views: &mut Vec<TaskView<'a>>, levels: &mut Vec<usize>) {
        views.push(*self);
        levels.push(level);
        for child in self.child_views() {
            child.collect_levels(level + 1, views, levels);
        }
    }
}

impl std::fmt::Debug for TaskView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskView")
            .field("name", &self.task().name)
            .field("start", &self.start().map(time::format_instant))
            .field("end", &self.end().map(time::format_instant))
            .finish()
    }
}

impl Timeline for TaskView<'_> {
    fn name(&self) -> &str {
        &self.task().name
    }

    fn nickname(&self) -> &str {
        self.task().label()
    }

    fn start(&self) -> Option<Instant> {
        self.fields().start(self.id, true)
    }

    fn end(&self) -> Option<Instant> {
        self.fields().end(self.id, true)
    }

    fn duration(&self) -> Option<TimeSpan> {
        self.fields().duration(self.id, true)
    }

    fn percent(&self) -> Option<u8> {
        self.fields().percent(self.id)
    }

    fn children(&self) -> Vec<TaskView<'_>> {
        self.child_views()
    }

    /// The task itself at depth 0, then its descendants.
    fn flatten_with_levels(&self) -> (Vec<TaskView<'_>>, Vec<usize>) {
        let mut views = Vec::new();
        let mut levels = Vec::new();
        self.collect_levels(0, &mut views, &mut levels);
        (views, levels)
    }
}
