use crate::hierarchy::TaskHierarchy;
use crate::task::TaskId;
use crate::tree::TaskTree;

/// Rolls children's progress up into their containers, weighted by duration.
pub struct RecalculateTaskCompletionPercentage;

impl RecalculateTaskCompletionPercentage {
    /// Recomputes every container under `container` (inclusive), deepest first.
    pub fn execute(tree: &mut TaskTree, container: TaskId) {
        let mut containers = TaskHierarchy::new(tree).deep_nested_tasks(container);
        containers.insert(0, container);
        for id in containers.into_iter().rev() {
            if let Some(percentage) = Self::weighted_completion(tree, id) {
                if let Some(task) = tree.node_mut(id) {
                    task.set_completion_percentage(percentage);
                }
            }
        }
    }

    /// `None` for leaf tasks, which keep their own percentage.
    fn weighted_completion(tree: &TaskTree, container: TaskId) -> Option<u8> {
        let children: Vec<(f64, f64)> = tree
            .node(container)?
            .children()
            .iter()
            .filter_map(|id| tree.node(*id))
            .map(|child| {
                (
                    child.effective_duration().nominal_hours(),
                    f64::from(child.completion_percentage()),
                )
            })
            .collect();
        if children.is_empty() {
            return None;
        }

        let total_weight: f64 = children.iter().map(|(weight, _)| weight).sum();
        let value = if total_weight > 0.0 {
            children.iter().map(|(weight, done)| weight * done).sum::<f64>() / total_weight
        } else {
            children.iter().map(|(_, done)| done).sum::<f64>() / children.len() as f64
        };
        Some(value.round().clamp(0.0, 100.0) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::TaskLength;
    use crate::task::{ROOT_TASK_ID, Task};
    use chrono::NaiveDate;

    #[test]
    fn weights_by_duration() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut tree = TaskTree::new(Task::new(ROOT_TASK_ID, start));
        for (id, parent) in [(0, ROOT_TASK_ID), (1, 0), (2, 0)] {
            tree.register(Task::new(id, start));
            tree.move_task(id, parent, None).unwrap();
        }
        let one = tree.get_mut(1).unwrap();
        one.set_duration(TaskLength::days(3));
        one.set_completion_percentage(100);
        tree.get_mut(2).unwrap().set_duration(TaskLength::days(1));

        RecalculateTaskCompletionPercentage::execute(&mut tree, ROOT_TASK_ID);
        assert_eq!(tree.get(0).unwrap().completion_percentage(), 75);
        assert_eq!(tree.root().completion_percentage(), 75);
    }

    #[test]
    fn milestones_only_use_plain_average() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut tree = TaskTree::new(Task::new(ROOT_TASK_ID, start));
        for id in [1, 2] {
            let mut task = Task::new(id, start);
            task.milestone = true;
            tree.register(task);
            tree.move_task(id, ROOT_TASK_ID, None).unwrap();
        }
        tree.get_mut(1).unwrap().set_completion_percentage(100);

        RecalculateTaskCompletionPercentage::execute(&mut tree, ROOT_TASK_ID);
        assert_eq!(tree.root().completion_percentage(), 50);
    }
}
