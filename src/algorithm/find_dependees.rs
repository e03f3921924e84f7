use crate::hierarchy::TaskHierarchy;
use crate::task::TaskId;
use crate::tree::TaskTree;

/// Tasks `task` may legally depend on, in document order.
pub fn find_possible_dependees(tree: &TaskTree, task: TaskId) -> Vec<TaskId> {
    let hierarchy = TaskHierarchy::new(tree);
    tree.sorted_ids()
        .iter()
        .copied()
        .filter(|candidate| hierarchy.are_unrelated(task, *candidate))
        .collect()
}
