use super::adjust_bounds::AdjustTaskBounds;
use super::dag::{DagKind, ScheduleDag, ScheduleEdge};
use crate::calendar::{MoveDirection, WorkingCalendar};
use crate::dependency::TaskDependencyCollection;
use crate::error::DependencyError;
use crate::hierarchy::TaskHierarchy;
use crate::task::TaskId;
use crate::tree::TaskTree;
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use tracing::debug;

/// A task whose dates were changed by a recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleChange {
    pub task: TaskId,
    pub old_start: NaiveDateTime,
    pub old_end: NaiveDateTime,
}

/// Propagates dates along rigid dependencies.
///
/// Tasks without an incoming rigid dependency keep their dates; containers
/// are refitted to their children and, when they are dependants themselves,
/// moved together with the part of their subtree that is not pinned by a
/// dependency of its own. A pinned task never starts before the date implied
/// by its own dependencies nor by those of its containers.
pub struct RecalculateTaskSchedule<'a> {
    calendar: &'a dyn WorkingCalendar,
}

impl<'a> RecalculateTaskSchedule<'a> {
    pub fn new(calendar: &'a dyn WorkingCalendar) -> Self {
        Self { calendar }
    }

    pub fn execute(
        &self,
        tree: &mut TaskTree,
        dependencies: &TaskDependencyCollection,
    ) -> Result<Vec<ScheduleChange>, DependencyError> {
        let dag = ScheduleDag::build(tree, dependencies, DagKind::Propagation);
        let order = dag.topological_order().ok_or(DependencyError::Cycle)?;
        let bounds = AdjustTaskBounds::new(self.calendar);
        let mut changes: Vec<ScheduleChange> = Vec::new();

        for task_id in order {
            let Some(task) = tree.get(task_id) else {
                continue;
            };
            let (old_start, old_end) = (task.start(), task.end());
            let is_container = task.has_children();
            if is_container {
                bounds.fit_to_children(tree, task_id);
            }

            if is_pinned(&dag, task_id) {
                if let Some(target) = self.earliest_start(tree, &dag, task_id) {
                    if is_container {
                        self.shift_subtree(tree, &dag, task_id, target, &mut changes);
                    } else if tree.get(task_id).is_some_and(|t| t.start() != target) {
                        self.place(tree, task_id, target);
                    }
                }
            }

            if let Some(task) = tree.get(task_id) {
                if task.start() != old_start || task.end() != old_end {
                    record(&mut changes, task_id, old_start, old_end);
                }
            }
        }

        self.report_soft_violations(tree, dependencies);
        Ok(changes)
    }

    /// Latest start demanded by the task's incoming rigid dependencies,
    /// snapped to working time.
    fn implied_start(&self, tree: &TaskTree, dag: &ScheduleDag, task_id: TaskId) -> Option<NaiveDateTime> {
        let node_ix = *dag.id_to_index.get(&task_id)?;
        let dependant = tree.get(task_id)?;
        dag.graph
            .edges_directed(node_ix, Direction::Incoming)
            .filter_map(|edge| match *edge.weight() {
                ScheduleEdge::Dependency {
                    constraint,
                    difference,
                    rigid: true,
                } => {
                    let dependee = tree.get(dag.graph[edge.source()])?;
                    Some(constraint.implied_start(dependee, dependant, difference, self.calendar))
                }
                _ => None,
            })
            .max()
            .map(|start| self.calendar.find_closest_working_time(start))
    }

    /// Latest implied start over the task and all of its containers.
    fn earliest_start(&self, tree: &TaskTree, dag: &ScheduleDag, task_id: TaskId) -> Option<NaiveDateTime> {
        std::iter::once(task_id)
            .chain(TaskHierarchy::new(tree).ancestors(task_id))
            .filter_map(|id| self.implied_start(tree, dag, id))
            .max()
    }

    fn place(&self, tree: &mut TaskTree, task_id: TaskId, start: NaiveDateTime) {
        let Some(task) = tree.get_mut(task_id) else {
            return;
        };
        let end = self
            .calendar
            .shift_date(start, &task.effective_duration(), MoveDirection::Forward);
        debug!("Task {} moved to {} .. {}", task_id, start, end);
        task.set_start(start);
        task.set_end(end);
    }

    /// Moves the unpinned leaves under `container` so the earliest of them
    /// starts at `target`, then refits the subtree.
    fn shift_subtree(
        &self,
        tree: &mut TaskTree,
        dag: &ScheduleDag,
        container: TaskId,
        target: NaiveDateTime,
        changes: &mut Vec<ScheduleChange>,
    ) {
        let nested = TaskHierarchy::new(tree).deep_nested_tasks(container);
        let before: Vec<(TaskId, NaiveDateTime, NaiveDateTime)> = nested
            .iter()
            .filter_map(|id| tree.get(*id).map(|t| (*id, t.start(), t.end())))
            .collect();
        let free = free_leaves(tree, dag, container);
        let Some(earliest) = free.iter().filter_map(|id| tree.get(*id)).map(|t| t.start()).min() else {
            return;
        };
        let delta = target - earliest;
        if delta.is_zero() {
            return;
        }
        debug!("Shifting {} free tasks of container {} by {}", free.len(), container, delta);

        for id in free {
            if let Some(start) = tree.get(id).map(|t| t.start()) {
                let start = self.calendar.find_closest_working_time(start + delta);
                self.place(tree, id, start);
            }
        }

        let bounds = AdjustTaskBounds::new(self.calendar);
        for &id in nested.iter().rev() {
            if tree.get(id).is_some_and(|t| t.has_children()) {
                bounds.fit_to_children(tree, id);
            }
        }
        bounds.fit_to_children(tree, container);

        for (id, old_start, old_end) in before {
            if tree.get(id).is_some_and(|t| t.start() != old_start || t.end() != old_end) {
                record(changes, id, old_start, old_end);
            }
        }
    }

    fn report_soft_violations(&self, tree: &TaskTree, dependencies: &TaskDependencyCollection) {
        for dependency in dependencies.iter().filter(|d| !d.is_rigid()) {
            let (Some(dependee), Some(dependant)) =
                (tree.get(dependency.dependee()), tree.get(dependency.dependant()))
            else {
                continue;
            };
            if !dependency.is_satisfied(dependee, dependant, self.calendar) {
                debug!(
                    "Soft dependency {} -> {} is violated",
                    dependency.dependant(),
                    dependency.dependee()
                );
            }
        }
    }
}

/// Keeps the first recorded old span of each task.
fn record(changes: &mut Vec<ScheduleChange>, task: TaskId, old_start: NaiveDateTime, old_end: NaiveDateTime) {
    if changes.iter().all(|c| c.task != task) {
        changes.push(ScheduleChange {
            task,
            old_start,
            old_end,
        });
    }
}

fn is_pinned(dag: &ScheduleDag, task_id: TaskId) -> bool {
    dag.id_to_index.get(&task_id).is_some_and(|&ix| {
        dag.graph
            .edges_directed(ix, Direction::Incoming)
            .any(|edge| matches!(edge.weight(), ScheduleEdge::Dependency { rigid: true, .. }))
    })
}

/// Leaves under `container` not reached through a pinned task; pinned
/// subtrees were already placed on their own turn.
fn free_leaves(tree: &TaskTree, dag: &ScheduleDag, container: TaskId) -> Vec<TaskId> {
    let hierarchy = TaskHierarchy::new(tree);
    let mut leaves = Vec::new();
    let mut stack: Vec<TaskId> = hierarchy.nested_tasks(container).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if is_pinned(dag, id) {
            continue;
        }
        let children = hierarchy.nested_tasks(id);
        if children.is_empty() {
            leaves.push(id);
        } else {
            stack.extend(children.iter().rev());
        }
    }
    leaves
}
