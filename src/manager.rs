use crate::algorithm::{AdjustTaskBounds, AlgorithmCollection, ProjectBounds, ScheduleChange};
use crate::calendar::{MoveDirection, WorkCalendar, WorkingCalendar};
use crate::config::TaskManagerConfig;
use crate::custom_property::{CustomColumnsStorage, CustomValue};
use crate::dependency::{ConstraintType, Hardness, TaskDependency, TaskDependencyCollection};
use crate::duration::TaskLength;
use crate::error::{ConfigError, CustomPropertyError, DependencyError, TaskTreeError};
use crate::event::{NullEventSink, TaskEvent, TaskEventSink};
use crate::hierarchy::TaskHierarchy;
use crate::task::{ROOT_TASK_ID, Task, TaskId};
use crate::time_unit::{TimeUnit, TimeUnitStack};
use crate::tree::TaskTree;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Aggregate root of a project's task model.
///
/// Owns the task tree, the dependency graph and the algorithm pipeline, and
/// reports every committed change to its event sink. All mutation goes
/// through here so derived state (ends, container spans, critical flags)
/// stays consistent.
pub struct TaskManager {
    pub(crate) config: TaskManagerConfig,
    pub(crate) tree: TaskTree,
    pub(crate) dependencies: TaskDependencyCollection,
    pub(crate) algorithms: AlgorithmCollection,
    pub(crate) custom_columns: CustomColumnsStorage,
    sink: Box<dyn TaskEventSink>,
    events_enabled: bool,
}

impl TaskManager {
    pub fn new(config: TaskManagerConfig) -> Result<Self, ConfigError> {
        Self::with_event_sink(config, Box::new(NullEventSink))
    }

    pub fn with_event_sink(
        config: TaskManagerConfig,
        sink: Box<dyn TaskEventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let calendar = WorkCalendar::from_config(&config.calendar)?;
        Ok(Self::with_calendar(config, Box::new(calendar), sink))
    }

    /// Builds a manager around a caller-provided calendar; the calendar part
    /// of `config` is then ignored.
    pub fn with_calendar(
        config: TaskManagerConfig,
        calendar: Box<dyn WorkingCalendar>,
        sink: Box<dyn TaskEventSink>,
    ) -> Self {
        let algorithms = AlgorithmCollection::new(calendar);
        let root = Self::new_root(&config, algorithms.calendar());
        Self {
            config,
            tree: TaskTree::new(root),
            dependencies: TaskDependencyCollection::new(),
            algorithms,
            custom_columns: CustomColumnsStorage::default(),
            sink,
            events_enabled: true,
        }
    }

    fn new_root(config: &TaskManagerConfig, calendar: &dyn WorkingCalendar) -> Task {
        let start = config.project_start();
        let mut root = Task::new(ROOT_TASK_ID, start);
        root.name = "root".to_string();
        root.set_end(calendar.shift_date(start, &root.duration(), MoveDirection::Forward));
        root
    }

    /// A manager with the same configuration and custom columns but no tasks.
    pub fn empty_clone(&self) -> Result<TaskManager, ConfigError> {
        let mut clone = TaskManager::new(self.config.clone())?;
        clone.custom_columns = self.custom_columns.clone();
        Ok(clone)
    }

    pub fn config(&self) -> &TaskManagerConfig {
        &self.config
    }

    pub fn time_units(&self) -> &TimeUnitStack {
        &self.config.time_units
    }

    pub fn calendar(&self) -> &dyn WorkingCalendar {
        self.algorithms.calendar()
    }

    pub fn algorithms(&self) -> &AlgorithmCollection {
        &self.algorithms
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn hierarchy(&self) -> TaskHierarchy<'_> {
        TaskHierarchy::new(&self.tree)
    }

    pub fn dependencies(&self) -> &TaskDependencyCollection {
        &self.dependencies
    }

    pub fn custom_columns(&self) -> &CustomColumnsStorage {
        &self.custom_columns
    }

    pub fn custom_columns_mut(&mut self) -> &mut CustomColumnsStorage {
        &mut self.custom_columns
    }

    pub fn root(&self) -> &Task {
        self.tree.root()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tree.get(id)
    }

    pub fn task_count(&self) -> usize {
        self.tree.len()
    }

    /// Registered task ids in document order.
    pub fn task_ids(&self) -> &[TaskId] {
        self.tree.sorted_ids()
    }

    /// Registered tasks in document order.
    pub fn tasks(&self) -> Vec<&Task> {
        self.tree
            .sorted_ids()
            .iter()
            .filter_map(|id| self.tree.get(*id))
            .collect()
    }

    pub fn default_task_name(&self, id: TaskId) -> String {
        format!("{} {}", self.config.task_name_prefix, id)
    }

    pub fn events_enabled(&self) -> bool {
        self.events_enabled
    }

    /// Switches event delivery; bulk operations turn it off and refresh once at the end.
    pub fn set_events_enabled(&mut self, enabled: bool) {
        self.events_enabled = enabled;
    }

    pub(crate) fn fire(&mut self, event: TaskEvent) {
        if self.events_enabled {
            self.sink.on_event(&event);
        }
    }

    fn fire_schedule_changes(&mut self, changes: &[ScheduleChange]) {
        for change in changes {
            if let Some(task) = self.tree.get(change.task) {
                let event = TaskEvent::TaskScheduleChanged {
                    task: change.task,
                    old_start: change.old_start,
                    old_end: change.old_end,
                    new_start: task.start(),
                    new_end: task.end(),
                };
                self.fire(event);
            }
        }
    }

    /// A fresh unregistered task with the next free id.
    pub fn create_task(&mut self) -> Task {
        let id = self.tree.allocate_id();
        self.new_task(id)
    }

    /// An unregistered task with `id`; later auto-assigned ids skip past it.
    pub fn create_task_with_id(&mut self, id: TaskId) -> Task {
        self.tree.observe_id(id);
        self.new_task(id)
    }

    fn new_task(&self, id: TaskId) -> Task {
        let start = self.calendar().find_closest_working_time(self.tree.root().start());
        let mut task = Task::new(id, start);
        task.color = self.config.default_color.clone();
        task.set_end(
            self.calendar()
                .shift_date(start, &task.effective_duration(), MoveDirection::Forward),
        );
        task
    }

    /// Indexes `task` by id without attaching it to the hierarchy. The end
    /// date is derived from start and duration.
    ///
    /// # Panics
    /// When a task with the same id is already registered.
    pub fn register_task(&mut self, mut task: Task) -> TaskId {
        if !task.has_children() {
            let end = self.calendar().shift_date(
                task.start(),
                &task.effective_duration(),
                MoveDirection::Forward,
            );
            task.set_end(end);
        }
        let id = self.tree.register(task);
        self.algorithms.invalidate();
        debug!("Registered task {}", id);
        self.fire(TaskEvent::TaskAdded(id));
        id
    }

    /// Registers `task` and attaches it under `container`.
    pub fn insert_task(
        &mut self,
        task: Task,
        container: TaskId,
        position: Option<usize>,
    ) -> Result<TaskId, TaskTreeError> {
        if container != ROOT_TASK_ID && !self.tree.contains(container) {
            return Err(TaskTreeError::UnknownTask(container));
        }
        let id = self.register_task(task);
        self.move_task(id, container, position)?;
        Ok(id)
    }

    /// Re-parents a registered task, refitting both old and new containers.
    /// A task that is not registered yet goes through [`insert_task`](Self::insert_task).
    pub fn move_task(
        &mut self,
        id: TaskId,
        container: TaskId,
        position: Option<usize>,
    ) -> Result<(), TaskTreeError> {
        let old_parent = self.tree.get(id).and_then(Task::parent);
        self.tree.move_task(id, container, position)?;

        if let Some(old_parent) = old_parent.filter(|p| *p != container) {
            self.refit(old_parent);
        }
        self.algorithms.adjust_task_bounds(&mut self.tree, id);
        self.algorithms
            .recalculate_completion_percentage(&mut self.tree, ROOT_TASK_ID);
        self.fire(TaskEvent::TaskPropertiesChanged(id));
        if self.config.auto_recalculate && self.events_enabled {
            self.process_critical_path();
        }
        Ok(())
    }

    /// Refits `container` to its remaining children and then its ancestors.
    fn refit(&mut self, container: TaskId) {
        if container == ROOT_TASK_ID {
            return;
        }
        AdjustTaskBounds::new(self.algorithms.calendar()).fit_to_children(&mut self.tree, container);
        self.algorithms.adjust_task_bounds(&mut self.tree, container);
    }

    /// Removes `id` with its subtree and every dependency touching them.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Vec<TaskId>, TaskTreeError> {
        let parent = self.tree.get(id).and_then(Task::parent);
        let removed: Vec<TaskId> = self.tree.remove(id)?.iter().map(Task::id).collect();

        let removed_set: HashSet<TaskId> = removed.iter().copied().collect();
        for dependency in self.dependencies.remove_involving(&removed_set) {
            self.fire(TaskEvent::DependencyRemoved {
                dependant: dependency.dependant(),
                dependee: dependency.dependee(),
            });
        }
        if let Some(parent) = parent {
            self.refit(parent);
        }
        self.algorithms
            .recalculate_completion_percentage(&mut self.tree, ROOT_TASK_ID);
        self.algorithms.invalidate();

        debug!("Deleted task {} with {} nested tasks", id, removed.len() - 1);
        for task in &removed {
            self.fire(TaskEvent::TaskRemoved(*task));
        }
        if self.config.auto_recalculate && self.events_enabled {
            self.process_critical_path();
        }
        Ok(removed)
    }

    /// Applies `change` to a registered task and propagates its consequences.
    ///
    /// The end date is recomputed from start and duration; containers are
    /// refitted to their children instead. Schedule changes refit the
    /// ancestors and, with `auto_recalculate`, rerun the critical path.
    pub fn update_task<F>(&mut self, id: TaskId, change: F) -> Result<(), TaskTreeError>
    where
        F: FnOnce(&mut Task),
    {
        let task = self.tree.get_mut(id).ok_or(TaskTreeError::UnknownTask(id))?;
        let (old_start, old_end, old_progress) = (task.start(), task.end(), task.completion_percentage());
        change(task);

        if task.has_children() {
            AdjustTaskBounds::new(self.algorithms.calendar()).fit_to_children(&mut self.tree, id);
        } else {
            let end = self.algorithms.calendar().shift_date(
                task.start(),
                &task.effective_duration(),
                MoveDirection::Forward,
            );
            task.set_end(end);
        }

        let Some(task) = self.tree.get(id) else {
            return Ok(());
        };
        let (new_start, new_end, new_progress) = (task.start(), task.end(), task.completion_percentage());

        if new_start != old_start || new_end != old_end {
            self.algorithms.adjust_task_bounds(&mut self.tree, id);
            self.fire(TaskEvent::TaskScheduleChanged {
                task: id,
                old_start,
                old_end,
                new_start,
                new_end,
            });
            if self.config.auto_recalculate && self.events_enabled {
                self.process_critical_path();
            }
        } else {
            self.fire(TaskEvent::TaskPropertiesChanged(id));
        }

        if new_progress != old_progress {
            self.algorithms
                .recalculate_completion_percentage(&mut self.tree, ROOT_TASK_ID);
            self.fire(TaskEvent::TaskProgressChanged(id));
        }
        Ok(())
    }

    pub fn set_custom_value(
        &mut self,
        id: TaskId,
        column: &str,
        value: CustomValue,
    ) -> Result<(), CustomPropertyError> {
        self.custom_columns.validate(column, &value)?;
        let task = self
            .tree
            .get_mut(id)
            .ok_or(CustomPropertyError::UnknownTask(id))?;
        task.custom_values.insert(column.to_string(), value);
        self.fire(TaskEvent::TaskPropertiesChanged(id));
        Ok(())
    }

    /// The task's value for `column`, falling back to the column default.
    pub fn custom_value(&self, id: TaskId, column: &str) -> Option<&CustomValue> {
        let task = self.tree.get(id)?;
        task.custom_values()
            .get(column)
            .or_else(|| self.custom_columns.column(column)?.default_value.as_ref())
    }

    pub fn remove_custom_value(&mut self, id: TaskId, column: &str) -> Option<CustomValue> {
        let removed = self.tree.get_mut(id)?.custom_values.remove(column);
        if removed.is_some() {
            self.fire(TaskEvent::TaskPropertiesChanged(id));
        }
        removed
    }

    pub fn create_dependency(
        &mut self,
        dependant: TaskId,
        dependee: TaskId,
        constraint: ConstraintType,
    ) -> Result<(), DependencyError> {
        self.create_dependency_with(dependant, dependee, constraint, 0, Hardness::Rigid)
    }

    pub fn create_dependency_with(
        &mut self,
        dependant: TaskId,
        dependee: TaskId,
        constraint: ConstraintType,
        difference: i32,
        hardness: Hardness,
    ) -> Result<(), DependencyError> {
        self.dependencies
            .create(&self.tree, dependant, dependee, constraint)?;
        if let Some(dependency) = self.dependencies.get_mut(dependant, dependee) {
            dependency.difference = difference;
            dependency.hardness = hardness;
        }
        self.fire(TaskEvent::DependencyAdded { dependant, dependee });
        if self.config.auto_recalculate && self.events_enabled {
            self.process_critical_path();
        }
        Ok(())
    }

    /// Edits the lag, hardness or constraint of an existing dependency.
    pub fn update_dependency<F>(&mut self, dependant: TaskId, dependee: TaskId, change: F) -> Result<(), DependencyError>
    where
        F: FnOnce(&mut TaskDependency),
    {
        let dependency = self
            .dependencies
            .get_mut(dependant, dependee)
            .ok_or(DependencyError::NotFound { dependant, dependee })?;
        change(dependency);
        if self.config.auto_recalculate && self.events_enabled {
            self.process_critical_path();
        }
        Ok(())
    }

    pub fn remove_dependency(&mut self, dependant: TaskId, dependee: TaskId) -> Result<TaskDependency, DependencyError> {
        let removed = self.dependencies.remove(dependant, dependee)?;
        self.fire(TaskEvent::DependencyRemoved { dependant, dependee });
        if self.config.auto_recalculate && self.events_enabled {
            self.process_critical_path();
        }
        Ok(removed)
    }

    pub fn find_possible_dependees(&self, task: TaskId) -> Vec<TaskId> {
        self.algorithms.find_possible_dependees(&self.tree, task)
    }

    /// Propagates rigid dependencies and reports every moved task.
    pub fn recalculate_schedule(&mut self) -> Result<Vec<ScheduleChange>, DependencyError> {
        let changes = self
            .algorithms
            .recalculate_task_schedule(&mut self.tree, &self.dependencies)?;
        self.fire_schedule_changes(&changes);
        Ok(changes)
    }

    /// Recalculates the schedule, then marks exactly the critical tasks.
    ///
    /// Errors from either pass are logged; flags are only touched after a
    /// successful critical path run.
    pub fn process_critical_path(&mut self) {
        if let Err(err) = self.recalculate_schedule() {
            warn!("Schedule recalculation failed: {}", err);
        }
        match self.algorithms.critical_path(&self.tree, &self.dependencies) {
            Ok(critical) => {
                for task in self.tree.iter_mut() {
                    task.set_critical(false);
                }
                for task in self.tree.iter_mut() {
                    if critical.contains(&task.id()) {
                        task.set_critical(true);
                    }
                }
            }
            Err(err) => warn!("Critical path computation failed: {}", err),
        }
    }

    pub fn recalculate_completion(&mut self) {
        self.algorithms
            .recalculate_completion_percentage(&mut self.tree, ROOT_TASK_ID);
    }

    pub fn project_bounds(&self) -> ProjectBounds {
        self.algorithms.project_bounds(&self.tree)
    }

    pub fn project_start(&self) -> NaiveDateTime {
        self.project_bounds().lower
    }

    pub fn project_end(&self) -> NaiveDateTime {
        self.project_bounds().upper
    }

    /// Working time between project start and end, in days.
    pub fn project_length(&self) -> TaskLength {
        let bounds = self.project_bounds();
        let length = self.calendar().working_time_between(bounds.lower, bounds.upper);
        length.convert_to(TimeUnit::Day).unwrap_or(length)
    }

    /// Rolled-up completion of the whole project.
    pub fn project_completion(&self) -> u8 {
        self.tree.root().completion_percentage()
    }

    /// Forgets every task and dependency and starts a fresh root.
    pub fn project_closed(&mut self) {
        let root = Self::new_root(&self.config, self.algorithms.calendar());
        self.tree.reset(root);
        self.dependencies.clear();
        self.algorithms.reset();
        info!("Project closed");
        self.fire(TaskEvent::ModelReset);
    }

    /// Brings derived state up to date after a project was loaded.
    pub fn project_opened(&mut self) {
        self.algorithms.adjust_all_bounds(&mut self.tree);
        self.process_critical_path();
        self.recalculate_completion();
        info!("Project opened with {} tasks", self.tree.len());
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("config", &self.config)
            .field("tasks", &self.tree.len())
            .field("dependencies", &self.dependencies.len())
            .field("events_enabled", &self.events_enabled)
            .finish_non_exhaustive()
    }
}
