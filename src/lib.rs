pub mod algorithm;
pub mod calendar;
pub mod config;
pub mod custom_property;
pub mod dependency;
pub mod duration;
pub mod error;
pub mod event;
pub mod hierarchy;
mod import;
pub mod manager;
pub mod resource;
pub mod task;
pub mod time_unit;
pub mod tree;

pub use algorithm::{AlgorithmCollection, ProjectBounds, ScheduleChange};
pub use calendar::{AlwaysWorkingCalendar, MoveDirection, WorkCalendar, WorkCalendarConfig, WorkingCalendar};
pub use config::TaskManagerConfig;
pub use custom_property::{CustomColumn, CustomColumnsStorage, CustomPropertyType, CustomValue};
pub use dependency::{ConstraintType, Hardness, TaskDependency, TaskDependencyCollection};
pub use duration::TaskLength;
pub use error::{ConfigError, CustomPropertyError, DependencyError, DurationParseError, TaskTreeError};
pub use event::{NullEventSink, RecordingEventSink, TaskEvent, TaskEventSink};
pub use hierarchy::TaskHierarchy;
pub use manager::TaskManager;
pub use resource::{ResourceAssignment, ResourceId};
pub use task::{ROOT_TASK_ID, Task, TaskId, ThirdDateConstraint};
pub use time_unit::{TimeUnit, TimeUnitStack};
pub use tree::TaskTree;
