use crate::error::{ScheduleError, ScheduleResult};
use crate::task::TaskId;
use crate::time::{self, Instant, TimeSpan};
use crate::tree::TaskTree;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::trace;

type Resolved = Option<(Instant, Origin)>;

/// Where a resolved field value came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Stored,
    Children,
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
    Duration,
}

impl TimeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeField::Start => "start",
            TimeField::End => "end",
            TimeField::Duration => "duration",
        }
    }
}

/// Mean of the given percents rounded half away from zero, or `None` when
/// there are none.
pub(crate) fn rounded_mean(percents: impl IntoIterator<Item = u8>) -> Option<u8> {
    let (sum, count) = percents
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), percent| (sum + u32::from(percent), count + 1));
    if count == 0 {
        return None;
    }
    Some((f64::from(sum) / f64::from(count)).round() as u8)
}

/// Computes effective start/end/duration for tasks of a tree.
///
/// Each field is tried as stored value, then child aggregation, then (only
/// when `calculate` is set) arithmetic over the other two fields. The
/// arithmetic step reads its inputs with `calculate` off, so the three
/// fields never recurse into each other more than one level.
///
/// Fully calculated starts and ends are cached for the lifetime of the
/// resolver, so every subtree is walked once per field.
pub struct FieldResolver<'a> {
    tree: &'a TaskTree,
    starts: RefCell<HashMap<TaskId, Resolved>>,
    ends: RefCell<HashMap<TaskId, Resolved>>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(tree: &'a TaskTree) -> Self {
        Self {
            tree,
            starts: RefCell::new(HashMap::new()),
            ends: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn start(&self, id: TaskId, calculate: bool) -> Option<Instant> {
        self.start_with_origin(id, calculate).map(|(value, _)| value)
    }

    pub(crate) fn end(&self, id: TaskId, calculate: bool) -> Option<Instant> {
        self.end_with_origin(id, calculate).map(|(value, _)| value)
    }

    pub(crate) fn duration(&self, id: TaskId, calculate: bool) -> Option<TimeSpan> {
        self.duration_with_origin(id, calculate).map(|(value, _)| value)
    }

    pub(crate) fn origin(&self, id: TaskId, field: TimeField) -> Option<Origin> {
        match field {
            TimeField::Start => self.start_with_origin(id, true).map(|(_, origin)| origin),
            TimeField::End => self.end_with_origin(id, true).map(|(_, origin)| origin),
            TimeField::Duration => self.duration_with_origin(id, true).map(|(_, origin)| origin),
        }
    }

    fn start_with_origin(&self, id: TaskId, calculate: bool) -> Resolved {
        if !calculate {
            return self.resolve_start(id, false);
        }
        let cached = self.starts.borrow().get(&id).copied();
        if let Some(resolved) = cached {
            return resolved;
        }
        let resolved = self.resolve_start(id, true);
        self.starts.borrow_mut().insert(id, resolved);
        resolved
    }

    fn end_with_origin(&self, id: TaskId, calculate: bool) -> Resolved {
        if !calculate {
            return self.resolve_end(id, false);
        }
        let cached = self.ends.borrow().get(&id).copied();
        if let Some(resolved) = cached {
            return resolved;
        }
        let resolved = self.resolve_end(id, true);
        self.ends.borrow_mut().insert(id, resolved);
        resolved
    }

    fn resolve_start(&self, id: TaskId, calculate: bool) -> Resolved {
        let task = self.tree.node(id);
        if let Some(start) = task.start {
            return Some((start, Origin::Stored));
        }
        // Children are always fully resolved; recursion goes down the tree.
        if let Some(start) = task.children.iter().filter_map(|child| self.start(*child, true)).min() {
            return Some((start, Origin::Children));
        }
        if calculate {
            let end = self.end(id, false)?;
            let duration = self.duration(id, false)?;
            return time::sub(end, duration).map(|start| (start, Origin::Derived));
        }
        None
    }

    fn resolve_end(&self, id: TaskId, calculate: bool) -> Resolved {
        let task = self.tree.node(id);
        if let Some(end) = task.end {
            return Some((end, Origin::Stored));
        }
        if let Some(end) = task.children.iter().filter_map(|child| self.end(*child, true)).max() {
            return Some((end, Origin::Children));
        }
        if calculate {
            let start = self.start(id, false)?;
            let duration = self.duration(id, false)?;
            return time::add(start, duration).map(|end| (end, Origin::Derived));
        }
        None
    }

    fn duration_with_origin(&self, id: TaskId, calculate: bool) -> Option<(TimeSpan, Origin)> {
        let task = self.tree.node(id);
        if let Some(duration) = task.duration {
            return Some((duration, Origin::Stored));
        }
        if calculate {
            let start = self.start(id, false)?;
            let end = self.end(id, false)?;
            return Some((time::subtract(end, start), Origin::Derived));
        }
        None
    }

    /// Stored percent, else the rounded mean of the children that have one.
    pub(crate) fn percent(&self, id: TaskId) -> Option<u8> {
        let task = self.tree.node(id);
        if let Some(percent) = task.progress.percent {
            return Some(percent);
        }
        rounded_mean(task.children.iter().filter_map(|child| self.percent(*child)))
    }

    /// Checks that exactly one of start/end/duration is left for arithmetic.
    ///
    /// Not recursive: children are verified only when asked for explicitly.
    pub fn verify(&self, id: TaskId) -> ScheduleResult<()> {
        let task = self.tree.task(id)?;
        let known = [
            self.start(id, false).is_some(),
            self.end(id, false).is_some(),
            self.duration(id, false).is_some(),
        ]
        .into_iter()
        .filter(|known| *known)
        .count();
        trace!(task = %task.name, known, "verifying task");

        match known {
            3 => {
                return Err(ScheduleError::Overdefined {
                    task: task.name.clone(),
                });
            }
            2 => {}
            _ => {
                return Err(ScheduleError::Underdefined {
                    task: task.name.clone(),
                    known,
                });
            }
        }

        if let Some(duration) = self.duration(id, true).filter(TimeSpan::is_negative) {
            return Err(ScheduleError::NegativeDuration {
                task: task.name.clone(),
                duration,
            });
        }
        Ok(())
    }
}
