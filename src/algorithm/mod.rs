//! Recomputation passes run by the manager after structural or temporal edits.

pub mod adjust_bounds;
pub mod completion;
pub mod critical_path;
pub mod dag;
pub mod find_dependees;
pub mod project_bounds;
pub mod schedule;

pub use adjust_bounds::AdjustTaskBounds;
pub use completion::RecalculateTaskCompletionPercentage;
pub use critical_path::CriticalPathAlgorithm;
pub use dag::{DagKind, ScheduleDag, ScheduleEdge};
pub use find_dependees::find_possible_dependees;
pub use project_bounds::{ProjectBounds, ProjectBoundsAlgorithm};
pub use schedule::{RecalculateTaskSchedule, ScheduleChange};

use crate::calendar::WorkingCalendar;
use crate::dependency::TaskDependencyCollection;
use crate::error::DependencyError;
use crate::task::TaskId;
use crate::tree::TaskTree;
use std::cell::Cell;
use std::collections::HashSet;

/// The pipeline bound to one calendar, with its derived results cached
/// until the manager invalidates them.
pub struct AlgorithmCollection {
    calendar: Box<dyn WorkingCalendar>,
    bounds: Cell<Option<ProjectBounds>>,
    critical_tasks: Option<HashSet<TaskId>>,
}

impl AlgorithmCollection {
    pub fn new(calendar: Box<dyn WorkingCalendar>) -> Self {
        Self {
            calendar,
            bounds: Cell::new(None),
            critical_tasks: None,
        }
    }

    pub fn calendar(&self) -> &dyn WorkingCalendar {
        self.calendar.as_ref()
    }

    pub fn find_possible_dependees(&self, tree: &TaskTree, task: TaskId) -> Vec<TaskId> {
        find_possible_dependees(tree, task)
    }

    pub fn adjust_task_bounds(&self, tree: &mut TaskTree, task: TaskId) -> Vec<TaskId> {
        let changed = AdjustTaskBounds::new(self.calendar()).execute(tree, task);
        self.invalidate();
        changed
    }

    /// Refits every container of the tree, deepest first.
    pub fn adjust_all_bounds(&self, tree: &mut TaskTree) -> Vec<TaskId> {
        let changed = AdjustTaskBounds::new(self.calendar()).execute_all(tree);
        self.invalidate();
        changed
    }

    pub fn recalculate_task_schedule(
        &self,
        tree: &mut TaskTree,
        dependencies: &TaskDependencyCollection,
    ) -> Result<Vec<ScheduleChange>, DependencyError> {
        let changes = RecalculateTaskSchedule::new(self.calendar()).execute(tree, dependencies);
        self.invalidate();
        changes
    }

    pub fn recalculate_completion_percentage(&self, tree: &mut TaskTree, container: TaskId) {
        RecalculateTaskCompletionPercentage::execute(tree, container);
    }

    pub fn project_bounds(&self, tree: &TaskTree) -> ProjectBounds {
        if let Some(bounds) = self.bounds.get() {
            return bounds;
        }
        let bounds = ProjectBoundsAlgorithm::execute(tree);
        self.bounds.set(Some(bounds));
        bounds
    }

    pub fn critical_path(
        &mut self,
        tree: &TaskTree,
        dependencies: &TaskDependencyCollection,
    ) -> Result<&HashSet<TaskId>, DependencyError> {
        let project_end = self.project_bounds(tree).upper;
        let critical = CriticalPathAlgorithm::new(self.calendar()).execute(tree, dependencies, project_end)?;
        let critical: &HashSet<TaskId> = self.critical_tasks.insert(critical);
        Ok(critical)
    }

    /// Result of the last successful critical path run.
    pub fn critical_tasks(&self) -> Option<&HashSet<TaskId>> {
        self.critical_tasks.as_ref()
    }

    /// Drops cached bounds; called on every schedule-affecting change.
    pub fn invalidate(&self) {
        self.bounds.set(None);
    }

    pub(crate) fn reset(&mut self) {
        self.invalidate();
        self.critical_tasks = None;
    }
}

impl std::fmt::Debug for AlgorithmCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmCollection")
            .field("bounds", &self.bounds.get())
            .field("critical_tasks", &self.critical_tasks)
            .finish_non_exhaustive()
    }
}
