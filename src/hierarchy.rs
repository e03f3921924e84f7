use crate::task::{ROOT_TASK_ID, Task, TaskId};
use crate::tree::TaskTree;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Read-only containment view over a [`TaskTree`].
///
/// Cheap to build; callers create one per query batch instead of keeping it
/// across mutations.
#[derive(Debug, Clone, Copy)]
pub struct TaskHierarchy<'a> {
    tree: &'a TaskTree,
}

impl<'a> TaskHierarchy<'a> {
    pub fn new(tree: &'a TaskTree) -> Self {
        Self { tree }
    }

    pub fn root(&self) -> &'a Task {
        self.tree.root()
    }

    /// Direct children of `container`, in order.
    pub fn nested_tasks(&self, container: TaskId) -> &'a [TaskId] {
        self.tree
            .node(container)
            .map(|task| task.children())
            .unwrap_or(&[])
    }

    /// Every descendant of `container`, depth-first, children in order.
    pub fn deep_nested_tasks(&self, container: TaskId) -> Vec<TaskId> {
        let mut result = Vec::new();
        let mut stack: Vec<TaskId> = self.nested_tasks(container).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nested_tasks(id).iter().rev().copied());
        }
        result
    }

    pub fn has_nested_tasks(&self, container: TaskId) -> bool {
        !self.nested_tasks(container).is_empty()
    }

    pub fn container(&self, id: TaskId) -> Option<TaskId> {
        self.tree.node(id).and_then(Task::parent)
    }

    /// Ancestors of `id`, nearest first, ending at the root when attached.
    pub fn ancestors(&self, id: TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut current = self.container(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.container(parent);
        }
        chain
    }

    /// Whether `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: TaskId, id: TaskId) -> bool {
        let mut current = self.container(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.container(parent);
        }
        false
    }

    /// Neither task is an ancestor of the other.
    pub fn are_unrelated(&self, first: TaskId, second: TaskId) -> bool {
        if first == second {
            return false;
        }
        let first_chain: HashSet<TaskId> = self.ancestors(first).into_iter().collect();
        if first_chain.contains(&second) {
            return false;
        }
        !self.ancestors(second).contains(&first)
    }

    /// Distance from the root; top-level tasks have depth 1.
    pub fn depth(&self, id: TaskId) -> usize {
        if id == ROOT_TASK_ID {
            return 0;
        }
        self.ancestors(id).len()
    }

    /// Path from the topmost reachable ancestor down to `id` inclusive.
    fn path_from_top(&self, id: TaskId) -> Vec<TaskId> {
        let mut path = self.ancestors(id);
        path.reverse();
        path.push(id);
        path
    }

    /// Total order matching a depth-first walk from the root.
    ///
    /// Tasks whose chain does not reach the root sort before attached ones;
    /// two detached subtrees are ordered by the id of their topmost task.
    pub fn compare_document_order(&self, first: TaskId, second: TaskId) -> Ordering {
        if first == second {
            return Ordering::Equal;
        }
        let first_path = self.path_from_top(first);
        let second_path = self.path_from_top(second);

        let first_rooted = first_path[0] == ROOT_TASK_ID;
        let second_rooted = second_path[0] == ROOT_TASK_ID;
        match (first_rooted, second_rooted) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }

        let shared = first_path
            .iter()
            .zip(&second_path)
            .take_while(|(a, b)| a == b)
            .count();
        if shared == 0 {
            return first_path[0].cmp(&second_path[0]);
        }
        // one path is a prefix of the other: the ancestor comes first
        if shared == first_path.len() {
            return Ordering::Less;
        }
        if shared == second_path.len() {
            return Ordering::Greater;
        }

        let siblings = self.nested_tasks(first_path[shared - 1]);
        let position = |id: TaskId| siblings.iter().position(|child| *child == id);
        position(first_path[shared]).cmp(&position(second_path[shared]))
    }

    /// Registered tasks in document order.
    pub fn tasks_in_document_order(&self) -> &'a [TaskId] {
        self.tree.sorted_ids()
    }
}
