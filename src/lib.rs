pub mod calculations;
pub mod config;
pub mod dependency;
pub mod error;
pub mod export;
pub mod persistence;
pub mod schedule;
pub mod task;
pub mod time;
pub mod timeline;
pub mod tree;

pub use calculations::{FieldResolver, LinkPhase, Origin, Propagation, PropagationOptions, TimeField};
pub use config::{DuplicateKeyPolicy, ResolverConfig};
pub use dependency::{Dependency, DependencyTarget, PartialConstraint, RelationKind};
pub use error::{ScheduleError, ScheduleResult};
pub use persistence::{
    PersistenceError, load_schedule_from_json, save_schedule_to_json, schedule_from_json_str,
    schedule_to_json_string,
};
pub use schedule::{Schedule, ScheduleMetadata};
pub use task::{DependencySpec, Progress, ProgressSpec, Task, TaskId, TaskSpec};
pub use time::{Instant, TimeSpan, format_instant, parse_instant};
pub use timeline::{TaskView, Timeline};
pub use tree::TaskTree;
