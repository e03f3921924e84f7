use super::dag::{DagKind, ScheduleDag, ScheduleEdge};
use crate::calendar::{MoveDirection, WorkingCalendar};
use crate::dependency::TaskDependencyCollection;
use crate::error::DependencyError;
use crate::task::TaskId;
use crate::tree::TaskTree;
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Backward pass over every dependency, flagging tasks with no slack.
pub struct CriticalPathAlgorithm<'a> {
    calendar: &'a dyn WorkingCalendar,
}

impl<'a> CriticalPathAlgorithm<'a> {
    pub fn new(calendar: &'a dyn WorkingCalendar) -> Self {
        Self { calendar }
    }

    pub fn execute(
        &self,
        tree: &TaskTree,
        dependencies: &TaskDependencyCollection,
        project_end: NaiveDateTime,
    ) -> Result<HashSet<TaskId>, DependencyError> {
        let dag = ScheduleDag::build(tree, dependencies, DagKind::Analysis);
        let mut order = dag.topological_order().ok_or(DependencyError::Cycle)?;
        order.reverse();

        // Latest (start, finish) keyed by task id
        let mut latest: HashMap<TaskId, (NaiveDateTime, NaiveDateTime)> = HashMap::new();
        let mut critical = HashSet::new();

        for task_id in order {
            let Some(task) = tree.get(task_id) else {
                continue;
            };
            let Some(&node_ix) = dag.id_to_index.get(&task_id) else {
                continue;
            };
            let duration = task.effective_duration();

            let mut lf = project_end;
            for edge in dag.graph.edges_directed(node_ix, Direction::Outgoing) {
                let Some(&(succ_ls, succ_lf)) = latest.get(&dag.graph[edge.target()]) else {
                    continue;
                };
                let bound = match *edge.weight() {
                    ScheduleEdge::Dependency {
                        constraint,
                        difference,
                        ..
                    } => constraint.implied_latest_finish(succ_ls, succ_lf, &duration, difference, self.calendar),
                    ScheduleEdge::Containment => succ_lf,
                    ScheduleEdge::Ordering => continue,
                };
                lf = lf.min(bound);
            }

            let ls = self.calendar.shift_date(lf, &duration, MoveDirection::Backward);
            latest.insert(task_id, (ls, lf));
            if ls <= task.start() {
                critical.insert(task_id);
            }
        }

        debug!("Critical path holds {} of {} tasks", critical.len(), tree.len());
        Ok(critical)
    }
}
