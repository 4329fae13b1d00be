use crate::dependency::{Dependency, DependencyTarget};
use crate::error::{ScheduleError, ScheduleResult};
use crate::time::{Instant, TimeSpan, format_instant};
use crate::tree::TaskTree;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Handle to a task inside the [`TaskTree`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub(crate) tree: u64,
    pub(crate) index: usize,
}

impl TaskId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{} of tree {}", self.index, self.tree)
    }
}

/// Completion state of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Progress {
    pub fn new(percent: u32, notes: impl Into<String>) -> ScheduleResult<Self> {
        let percent = u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| ScheduleError::InvalidProgress {
                task: String::new(),
                percent,
            })?;
        Ok(Self {
            percent: Some(percent),
            notes: notes.into(),
        })
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            percent: None,
            notes: notes.into(),
        }
    }
}

/// A node of a schedule.
///
/// The time fields hold *stored* values only: what was given at construction
/// or written by dependency propagation. Effective values, which also draw on
/// children and arithmetic, are read through [`TaskTree::view`].
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub nickname: Option<String>,
    pub id: Option<String>,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub duration: Option<TimeSpan>,
    pub progress: Progress,
    /// Descriptive fields (description, risks, todo, deliverables, ...) kept
    /// as-is and never read by the resolver.
    pub payload: Map<String, Value>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) children: Vec<TaskId>,
    pub(crate) parent: Option<TaskId>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nickname: None,
            id: None,
            start: None,
            end: None,
            duration: None,
            progress: Progress::default(),
            payload: Map::new(),
            dependencies: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_start(mut self, start: Instant) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Instant) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_duration(mut self, duration: TimeSpan) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Key used to find this task during linking: its id, else its name.
    pub fn lookup_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Display label: the nickname unless it is missing, blank or `None`.
    pub fn label(&self) -> &str {
        match self.nickname.as_deref().map(str::trim) {
            Some(nick) if !nick.is_empty() && nick != "None" => nick,
            _ => &self.name,
        }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Number of start/end/duration values stored on the task itself.
    pub fn stored_field_count(&self) -> usize {
        [self.start.is_some(), self.end.is_some(), self.duration.is_some()]
            .into_iter()
            .filter(|set| *set)
            .count()
    }
}

/// Dependency entry of a task record: `{"task": <name or id>, "type": <relation>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub task: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Nested task record as exchanged with loaders and persisted snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSpec>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Progress as it appears in a record; the percent is range-checked on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Converts the record's own fields into a [`Task`], leaving children and
    /// dependencies for the tree to attach.
    pub(crate) fn to_task(&self) -> ScheduleResult<Task> {
        let parse_time = |text: &Option<String>| text.as_deref().map(crate::time::parse_instant).transpose();
        let progress = match &self.progress {
            Some(ProgressSpec {
                percent: Some(percent),
                notes,
            }) => Progress::new(*percent, notes.clone()).map_err(|_| ScheduleError::InvalidProgress {
                task: self.name.clone(),
                percent: *percent,
            })?,
            Some(ProgressSpec { percent: None, notes }) => Progress::notes(notes.clone()),
            None => Progress::default(),
        };

        Ok(Task {
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            id: self.id.clone(),
            start: parse_time(&self.start)?,
            end: parse_time(&self.end)?,
            duration: self.duration.as_deref().map(TimeSpan::parse).transpose()?,
            progress,
            payload: self.payload.clone(),
            dependencies: Vec::new(),
            children: Vec::new(),
            parent: None,
        })
    }

    /// Rebuilds the record for `id` and its subtree from stored values only,
    /// so derived times are recomputed on the next load instead of frozen.
    pub fn from_tree(tree: &TaskTree, id: TaskId) -> ScheduleResult<Self> {
        let task = tree.task(id)?;
        let mut dependencies = Vec::with_capacity(task.dependencies.len());
        for dependency in &task.dependencies {
            let key = match dependency.target() {
                DependencyTarget::Task(target) => tree.task(*target)?.lookup_key().to_string(),
                DependencyTarget::Named(key) => key.clone(),
            };
            dependencies.push(DependencySpec {
                task: key,
                kind: dependency.kind().as_str().to_string(),
            });
        }
        let children = task
            .children
            .iter()
            .map(|child| Self::from_tree(tree, *child))
            .collect::<ScheduleResult<Vec<_>>>()?;
        let progress = (task.progress != Progress::default()).then(|| ProgressSpec {
            percent: task.progress.percent.map(u32::from),
            notes: task.progress.notes.clone(),
        });

        Ok(Self {
            name: task.name.clone(),
            id: task.id.clone(),
            nickname: task.nickname.clone(),
            start: task.start.map(format_instant),
            end: task.end.map(format_instant),
            duration: task.duration.map(|span| span.to_string()),
            dependencies,
            children,
            progress,
            payload: task.payload.clone(),
        })
    }
}
