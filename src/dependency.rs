use crate::calendar::{MoveDirection, WorkingCalendar};
use crate::duration::TaskLength;
use crate::error::DependencyError;
use crate::hierarchy::TaskHierarchy;
use crate::task::{Task, TaskId};
use crate::tree::TaskTree;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Temporal relation between a dependee and its dependant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    /// Dependant starts after the dependee finishes.
    #[default]
    FinishStart,
    /// Dependant finishes after the dependee finishes.
    FinishFinish,
    /// Dependant finishes after the dependee starts.
    StartFinish,
    /// Dependant starts after the dependee starts.
    StartStart,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 4] = [
        ConstraintType::FinishStart,
        ConstraintType::FinishFinish,
        ConstraintType::StartFinish,
        ConstraintType::StartStart,
    ];

    /// Numeric code used by project files: 1 finish-start, 2 finish-finish,
    /// 3 start-finish, 4 start-start.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(ConstraintType::FinishStart),
            2 => Some(ConstraintType::FinishFinish),
            3 => Some(ConstraintType::StartFinish),
            4 => Some(ConstraintType::StartStart),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            ConstraintType::FinishStart => 1,
            ConstraintType::FinishFinish => 2,
            ConstraintType::StartFinish => 3,
            ConstraintType::StartStart => 4,
        }
    }

    /// Earliest start of `dependant` allowed by `dependee`'s current dates.
    pub fn implied_start(
        self,
        dependee: &Task,
        dependant: &Task,
        difference: i32,
        calendar: &dyn WorkingCalendar,
    ) -> NaiveDateTime {
        let duration = dependant.effective_duration();
        match self {
            ConstraintType::FinishStart => apply_lag(calendar, dependee.end(), difference),
            ConstraintType::StartStart => apply_lag(calendar, dependee.start(), difference),
            ConstraintType::FinishFinish => {
                let end = apply_lag(calendar, dependee.end(), difference);
                calendar.shift_date(end, &duration, MoveDirection::Backward)
            }
            ConstraintType::StartFinish => {
                let end = apply_lag(calendar, dependee.start(), difference);
                calendar.shift_date(end, &duration, MoveDirection::Backward)
            }
        }
    }

    /// Latest finish of the dependee that keeps a dependant with latest
    /// span `[successor_start, successor_finish)` on time.
    pub fn implied_latest_finish(
        self,
        successor_start: NaiveDateTime,
        successor_finish: NaiveDateTime,
        dependee_duration: &TaskLength,
        difference: i32,
        calendar: &dyn WorkingCalendar,
    ) -> NaiveDateTime {
        match self {
            ConstraintType::FinishStart => apply_lag(calendar, successor_start, -difference),
            ConstraintType::FinishFinish => apply_lag(calendar, successor_finish, -difference),
            ConstraintType::StartStart => {
                let start = apply_lag(calendar, successor_start, -difference);
                calendar.shift_date(start, dependee_duration, MoveDirection::Forward)
            }
            ConstraintType::StartFinish => {
                let start = apply_lag(calendar, successor_finish, -difference);
                calendar.shift_date(start, dependee_duration, MoveDirection::Forward)
            }
        }
    }
}

/// Shifts `date` by `days` of working time; negative values move backwards.
fn apply_lag(calendar: &dyn WorkingCalendar, date: NaiveDateTime, days: i32) -> NaiveDateTime {
    if days == 0 {
        return date;
    }
    let direction = if days > 0 {
        MoveDirection::Forward
    } else {
        MoveDirection::Backward
    };
    calendar.shift_date(date, &TaskLength::days(days.unsigned_abs()), direction)
}

/// Whether recalculation enforces a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hardness {
    #[default]
    Rigid,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    dependant: TaskId,
    dependee: TaskId,
    pub constraint: ConstraintType,
    /// Lag in days, may be negative.
    pub difference: i32,
    pub hardness: Hardness,
}

impl TaskDependency {
    pub fn dependant(&self) -> TaskId {
        self.dependant
    }

    pub fn dependee(&self) -> TaskId {
        self.dependee
    }

    pub fn is_rigid(&self) -> bool {
        self.hardness == Hardness::Rigid
    }

    pub fn involves(&self, id: TaskId) -> bool {
        self.dependant == id || self.dependee == id
    }

    /// Whether the dependant's current dates honour this dependency.
    pub fn is_satisfied(&self, dependee: &Task, dependant: &Task, calendar: &dyn WorkingCalendar) -> bool {
        dependant.start() >= self.constraint.implied_start(dependee, dependant, self.difference, calendar)
    }
}

/// Every dependency of one task tree, unique per (dependant, dependee) pair.
#[derive(Debug, Clone, Default)]
pub struct TaskDependencyCollection {
    dependencies: Vec<TaskDependency>,
}

impl TaskDependencyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `dependant` depending on `dependee` after checking that both are
    /// registered, distinct, unrelated by containment and not already linked
    /// either way through other dependencies.
    pub fn create(
        &mut self,
        tree: &TaskTree,
        dependant: TaskId,
        dependee: TaskId,
        constraint: ConstraintType,
    ) -> Result<&TaskDependency, DependencyError> {
        for id in [dependant, dependee] {
            if !tree.contains(id) {
                return Err(DependencyError::UnknownTask(id));
            }
        }
        if dependant == dependee {
            return Err(DependencyError::SelfDependency(dependant));
        }
        if !TaskHierarchy::new(tree).are_unrelated(dependant, dependee) {
            return Err(DependencyError::RelatedTasks { dependant, dependee });
        }
        if self.get(dependant, dependee).is_some() {
            return Err(DependencyError::AlreadyExists { dependant, dependee });
        }
        if self.depends_transitively(dependee, dependant) {
            return Err(DependencyError::Loop { dependant, dependee });
        }

        debug!(dependant, dependee, ?constraint, "dependency created");
        self.dependencies.push(TaskDependency {
            dependant,
            dependee,
            constraint,
            difference: 0,
            hardness: Hardness::default(),
        });
        let last = self.dependencies.len() - 1;
        Ok(&self.dependencies[last])
    }

    /// Whether `task` reaches `target` by following dependee links.
    fn depends_transitively(&self, task: TaskId, target: TaskId) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![task];
        while let Some(current) = pending.pop() {
            if current == target {
                return true;
            }
            if seen.insert(current) {
                pending.extend(self.dependees_of(current).map(TaskDependency::dependee));
            }
        }
        false
    }

    pub fn remove(&mut self, dependant: TaskId, dependee: TaskId) -> Result<TaskDependency, DependencyError> {
        let idx = self
            .dependencies
            .iter()
            .position(|d| d.dependant == dependant && d.dependee == dependee)
            .ok_or(DependencyError::NotFound { dependant, dependee })?;
        Ok(self.dependencies.remove(idx))
    }

    /// Drops every dependency touching one of `tasks`, returning them.
    pub fn remove_involving(&mut self, tasks: &HashSet<TaskId>) -> Vec<TaskDependency> {
        let (removed, kept) = std::mem::take(&mut self.dependencies)
            .into_iter()
            .partition(|d| tasks.contains(&d.dependant) || tasks.contains(&d.dependee));
        self.dependencies = kept;
        removed
    }

    pub fn get(&self, dependant: TaskId, dependee: TaskId) -> Option<&TaskDependency> {
        self.dependencies
            .iter()
            .find(|d| d.dependant == dependant && d.dependee == dependee)
    }

    pub fn get_mut(&mut self, dependant: TaskId, dependee: TaskId) -> Option<&mut TaskDependency> {
        self.dependencies
            .iter_mut()
            .find(|d| d.dependant == dependant && d.dependee == dependee)
    }

    /// Dependencies constraining `task`, i.e. where it is the dependant.
    pub fn dependees_of(&self, task: TaskId) -> impl Iterator<Item = &TaskDependency> {
        self.dependencies.iter().filter(move |d| d.dependant == task)
    }

    /// Dependencies `task` constrains, i.e. where it is the dependee.
    pub fn dependants_of(&self, task: TaskId) -> impl Iterator<Item = &TaskDependency> {
        self.dependencies.iter().filter(move |d| d.dependee == task)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
    }
}
