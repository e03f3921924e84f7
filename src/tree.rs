use crate::error::TaskTreeError;
use crate::hierarchy::TaskHierarchy;
use crate::task::{ROOT_TASK_ID, Task, TaskId};
use std::cell::OnceCell;
use std::collections::HashMap;
use tracing::debug;

/// Owner of every registered task plus the synthetic root.
///
/// Tasks are indexed by id; structure lives in each task's `parent` and
/// `children` fields. The document-ordered snapshot is rebuilt lazily: any
/// structural mutation empties the cell and the next read sorts again.
#[derive(Debug, Clone)]
pub struct TaskTree {
    root: Task,
    tasks: HashMap<TaskId, Task>,
    sorted: OnceCell<Vec<TaskId>>,
    next_id: TaskId,
}

impl TaskTree {
    pub fn new(root: Task) -> Self {
        debug_assert_eq!(root.id(), ROOT_TASK_ID);
        Self {
            root,
            tasks: HashMap::new(),
            sorted: OnceCell::new(),
            next_id: 0,
        }
    }

    pub fn root(&self) -> &Task {
        &self.root
    }

    /// Registered task by id; the root is not registered.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Any node of the tree, root included.
    pub fn node(&self, id: TaskId) -> Option<&Task> {
        if id == ROOT_TASK_ID {
            Some(&self.root)
        } else {
            self.tasks.get(&id)
        }
    }

    pub(crate) fn node_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        if id == ROOT_TASK_ID {
            Some(&mut self.root)
        } else {
            self.tasks.get_mut(&id)
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    /// Next id handed out by [`allocate_id`](Self::allocate_id).
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub(crate) fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Keeps future auto-assigned ids clear of `id`.
    pub(crate) fn observe_id(&mut self, id: TaskId) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    /// Indexes `task` by id.
    ///
    /// # Panics
    /// When a task with the same id is already registered.
    pub(crate) fn register(&mut self, task: Task) -> TaskId {
        let id = task.id();
        if id == ROOT_TASK_ID || self.tasks.contains_key(&id) {
            panic!("There is a task that already has the ID {id}");
        }
        self.observe_id(id);
        self.tasks.insert(id, task);
        self.invalidate();
        id
    }

    /// Re-parents `id` under `target`, appending it or inserting at `position`.
    pub(crate) fn move_task(
        &mut self,
        id: TaskId,
        target: TaskId,
        position: Option<usize>,
    ) -> Result<(), TaskTreeError> {
        if id == ROOT_TASK_ID {
            return Err(TaskTreeError::RootNotMovable);
        }
        if !self.contains(id) {
            return Err(TaskTreeError::UnknownTask(id));
        }
        if target != ROOT_TASK_ID && !self.contains(target) {
            return Err(TaskTreeError::UnknownTask(target));
        }
        if target == id || TaskHierarchy::new(self).is_ancestor(id, target) {
            return Err(TaskTreeError::WouldCreateCycle { task: id, target });
        }

        self.detach(id);
        if let Some(container) = self.node_mut(target) {
            let idx = position
                .unwrap_or(container.children.len())
                .min(container.children.len());
            container.children.insert(idx, id);
        }
        if let Some(task) = self.tasks.get_mut(&id) {
            task.parent = Some(target);
        }
        self.invalidate();
        debug!("Moved task {} under {}", id, target);
        Ok(())
    }

    /// Removes `id` and its whole subtree from the index and from its parent's children.
    pub(crate) fn remove(&mut self, id: TaskId) -> Result<Vec<Task>, TaskTreeError> {
        if id == ROOT_TASK_ID {
            return Err(TaskTreeError::RootNotMovable);
        }
        if !self.contains(id) {
            return Err(TaskTreeError::UnknownTask(id));
        }
        self.detach(id);

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(task) = self.tasks.remove(&next) {
                pending.extend(task.children.iter().copied());
                removed.push(task);
            }
        }
        self.invalidate();
        Ok(removed)
    }

    fn detach(&mut self, id: TaskId) {
        let Some(parent) = self.tasks.get_mut(&id).and_then(|task| task.parent.take()) else {
            return;
        };
        if let Some(container) = self.node_mut(parent) {
            container.children.retain(|child| *child != id);
        }
    }

    /// All registered tasks in document order; sorted on the first read after a change.
    pub fn sorted_ids(&self) -> &[TaskId] {
        self.sorted.get_or_init(|| {
            let hierarchy = TaskHierarchy::new(self);
            let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
            ids.sort_by(|a, b| hierarchy.compare_document_order(*a, *b));
            ids
        })
    }

    pub(crate) fn invalidate(&mut self) {
        self.sorted.take();
    }

    /// Drops every registered task and restarts id allocation.
    pub(crate) fn reset(&mut self, root: Task) {
        self.root = root;
        self.tasks.clear();
        self.next_id = 0;
        self.invalidate();
    }
}
