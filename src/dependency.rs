use crate::error::{ScheduleError, ScheduleResult};
use crate::task::TaskId;
use crate::time::Instant;
use crate::timeline::Timeline;
use crate::tree::TaskTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six dependency relations a task may have on another task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// Must start before the target begins.
    StartsBefore,
    /// Must start at the same time as the target.
    StartsWith,
    /// Must start after the target is over.
    StartsAfter,
    /// Must end before the target starts.
    EndsBefore,
    /// Must end at the same time as the target.
    EndsWith,
    /// Must end after the target ends.
    EndsAfter,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::StartsBefore,
        RelationKind::StartsWith,
        RelationKind::StartsAfter,
        RelationKind::EndsBefore,
        RelationKind::EndsWith,
        RelationKind::EndsAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::StartsBefore => "startsBefore",
            RelationKind::StartsWith => "startsWith",
            RelationKind::StartsAfter => "startsAfter",
            RelationKind::EndsBefore => "endsBefore",
            RelationKind::EndsWith => "endsWith",
            RelationKind::EndsAfter => "endsAfter",
        }
    }

    /// Maps the target's resolved start/end to the constraint this relation
    /// places on the dependent task.
    ///
    /// `StartsBefore` and `StartsWith` both pin the dependent start to the
    /// target start; the inequality of `StartsBefore` is not modelled.
    pub fn constrain(&self, target_start: Option<Instant>, target_end: Option<Instant>) -> PartialConstraint {
        match self {
            RelationKind::StartsBefore | RelationKind::StartsWith => PartialConstraint::start(target_start),
            RelationKind::StartsAfter => PartialConstraint::start(target_end),
            RelationKind::EndsBefore => PartialConstraint::end(target_start),
            RelationKind::EndsWith | RelationKind::EndsAfter => PartialConstraint::end(target_end),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '_').collect();
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ScheduleError::InvalidRelationKind(s.to_string()))
    }
}

/// What a dependency points at: a live task handle, or a name/id reference
/// that the link phase has not replaced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyTarget {
    Task(TaskId),
    Named(String),
}

/// A directed edge from the owning task to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    target: DependencyTarget,
    kind: RelationKind,
}

impl Dependency {
    pub fn new(target: TaskId, kind: RelationKind) -> Self {
        Self {
            target: DependencyTarget::Task(target),
            kind,
        }
    }

    /// Builds a dependency from a relation name such as `"startsAfter"`.
    pub fn parse(target: TaskId, kind: &str) -> ScheduleResult<Self> {
        Ok(Self::new(target, kind.parse()?))
    }

    /// A dependency on the task whose id (or name) is `key`, to be linked later.
    pub fn named(key: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            target: DependencyTarget::Named(key.into()),
            kind,
        }
    }

    pub fn target(&self) -> &DependencyTarget {
        &self.target
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.target, DependencyTarget::Task(_))
    }

    pub(crate) fn link(&mut self, target: TaskId) {
        self.target = DependencyTarget::Task(target);
    }

    /// Resolves against the target's current start/end.
    ///
    /// Fields the target cannot yet supply come back empty; the caller
    /// decides whether to retry on a later pass.
    pub fn resolve(&self, tree: &TaskTree) -> ScheduleResult<PartialConstraint> {
        match &self.target {
            DependencyTarget::Task(handle) => {
                let target = tree.view(*handle)?;
                Ok(self.kind.constrain(target.start(), target.end()))
            }
            DependencyTarget::Named(reference) => Err(ScheduleError::UnresolvedDependency {
                task: String::new(),
                reference: reference.clone(),
            }),
        }
    }
}

/// A start and/or end value imposed by one or more dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialConstraint {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl PartialConstraint {
    pub fn start(value: Option<Instant>) -> Self {
        Self { start: value, end: None }
    }

    pub fn end(value: Option<Instant>) -> Self {
        Self { start: None, end: value }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Later constraints win on every field they populate.
    pub fn merge(&mut self, other: PartialConstraint) {
        if other.start.is_some() {
            self.start = other.start;
        }
        if other.end.is_some() {
            self.end = other.end;
        }
    }
}
