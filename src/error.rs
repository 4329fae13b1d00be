use crate::task::TaskId;
use crate::time::TimeSpan;

/// Errors raised while building, linking, propagating or verifying a task tree.
///
/// Every variant is raised at the point of detection and aborts the call that
/// hit it; nothing is retried or collected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// Malformed instant or duration text.
    #[error("invalid {expected} '{input}'")]
    Format {
        input: String,
        expected: &'static str,
    },

    #[error("'{0}' is not an allowable type of dependency")]
    InvalidRelationKind(String),

    /// A dependency still holds a name reference when it is resolved.
    #[error("task '{task}' has an unlinked dependency on '{reference}'")]
    UnresolvedDependency { task: String, reference: String },

    #[error("task '{task}' depends on '{reference}', which is not in the schedule")]
    DependencyNotFound { task: String, reference: String },

    /// start, end and duration are all known without arithmetic.
    #[error("task '{task}' is overdefined: start, end and duration are all set")]
    Overdefined { task: String },

    #[error("task '{task}' is underdefined: only {known} of start, end and duration can be determined")]
    Underdefined { task: String, known: usize },

    /// A handle that does not refer to a task of the tree it was used with.
    #[error("{handle} does not refer to a task in this schedule")]
    TypeMismatch { handle: TaskId },

    #[error("more than one task uses the lookup key '{key}'")]
    DuplicateTaskKey { key: String },

    #[error("task '{task}' has a negative duration {duration}")]
    NegativeDuration { task: String, duration: TimeSpan },

    #[error("task '{task}' has progress {percent}% (must be between 0 and 100)")]
    InvalidProgress { task: String, percent: u32 },
}

impl ScheduleError {
    pub(crate) fn format(input: impl Into<String>, expected: &'static str) -> Self {
        Self::Format {
            input: input.into(),
            expected,
        }
    }

    /// Names the dependent task on errors raised before it was known.
    pub(crate) fn for_task(self, name: &str) -> Self {
        match self {
            Self::UnresolvedDependency { task, reference } if task.is_empty() => {
                Self::UnresolvedDependency {
                    task: name.to_string(),
                    reference,
                }
            }
            other => other,
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
