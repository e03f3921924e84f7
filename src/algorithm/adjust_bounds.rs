use crate::calendar::WorkingCalendar;
use crate::task::{ROOT_TASK_ID, TaskId};
use crate::tree::TaskTree;
use tracing::debug;

/// Keeps containers spanning exactly the union of their children.
pub struct AdjustTaskBounds<'a> {
    calendar: &'a dyn WorkingCalendar,
}

impl<'a> AdjustTaskBounds<'a> {
    pub fn new(calendar: &'a dyn WorkingCalendar) -> Self {
        Self { calendar }
    }

    /// Refits every ancestor of `task`, nearest first. The root is left alone.
    pub fn execute(&self, tree: &mut TaskTree, task: TaskId) -> Vec<TaskId> {
        let mut changed = Vec::new();
        let mut current = tree.node(task).and_then(|t| t.parent());
        while let Some(container) = current.filter(|id| *id != ROOT_TASK_ID) {
            if self.fit_to_children(tree, container) {
                changed.push(container);
            }
            current = tree.node(container).and_then(|t| t.parent());
        }
        changed
    }

    /// Sets `container`'s span to its children's union; returns whether it moved.
    pub fn fit_to_children(&self, tree: &mut TaskTree, container: TaskId) -> bool {
        let Some(node) = tree.node(container) else {
            return false;
        };
        let span = node
            .children()
            .iter()
            .filter_map(|child| tree.node(*child))
            .map(|child| (child.start(), child.end()))
            .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)));
        let Some((start, end)) = span else {
            return false;
        };
        if node.start() == start && node.end() == end {
            return false;
        }

        let duration = self.calendar.working_time_between(start, end);
        if let Some(node) = tree.node_mut(container) {
            debug!("Container {} now spans {} .. {}", container, start, end);
            node.set_span(start, end, duration);
        }
        true
    }

    /// Refits every container of the tree, deepest first.
    pub fn execute_all(&self, tree: &mut TaskTree) -> Vec<TaskId> {
        let containers: Vec<TaskId> = tree
            .sorted_ids()
            .iter()
            .rev()
            .copied()
            .filter(|id| tree.get(*id).is_some_and(|t| t.has_children()))
            .collect();
        containers
            .into_iter()
            .filter(|id| self.fit_to_children(tree, *id))
            .collect()
    }
}
