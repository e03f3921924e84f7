use crate::task::TaskId;
use thiserror::Error;

/// Failure to turn a textual duration such as `"2d 4h"` into a [`TaskLength`](crate::TaskLength).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration expression")]
    Empty,

    #[error("digit expected at position {position}")]
    DigitExpected { position: usize },

    #[error("unit code expected at position {position}")]
    UnitExpected { position: usize },

    #[error("unknown time unit code '{0}'")]
    UnknownUnit(String),

    #[error("time units '{first}' and '{second}' cannot be combined")]
    IncompatibleUnits { first: String, second: String },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Errors raised while creating dependencies or propagating them through the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("task {0} is not registered")]
    UnknownTask(TaskId),

    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("task {dependant} and task {dependee} are related by containment")]
    RelatedTasks { dependant: TaskId, dependee: TaskId },

    #[error("dependency {dependant} -> {dependee} already exists")]
    AlreadyExists { dependant: TaskId, dependee: TaskId },

    #[error("dependency {dependant} -> {dependee} would create a loop")]
    Loop { dependant: TaskId, dependee: TaskId },

    #[error("dependency {dependant} -> {dependee} not found")]
    NotFound { dependant: TaskId, dependee: TaskId },

    #[error("cyclic constraint detected while recalculating the schedule")]
    Cycle,
}

/// Structural errors on the containment tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskTreeError {
    #[error("task {0} is not registered")]
    UnknownTask(TaskId),

    #[error("moving task {task} under {target} would make it its own descendant")]
    WouldCreateCycle { task: TaskId, target: TaskId },

    #[error("the root task cannot be moved or deleted")]
    RootNotMovable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomPropertyError {
    #[error("task {0} is not registered")]
    UnknownTask(TaskId),

    #[error("unknown custom column '{0}'")]
    UnknownColumn(String),

    #[error("custom column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("custom column '{0}' already exists")]
    DuplicateColumn(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
