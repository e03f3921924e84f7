//! Merging another manager's tasks into this one.

use crate::event::TaskEvent;
use crate::manager::TaskManager;
use crate::resource::{ResourceAssignment, ResourceId};
use crate::task::{ROOT_TASK_ID, TaskId};
use std::collections::HashMap;
use tracing::{debug, info, warn};

impl TaskManager {
    /// Copies every task of `other` under this manager's root, keeping the
    /// nesting, and replays its dependencies.
    ///
    /// Original ids are kept when free here, otherwise a fresh id is used.
    /// Returns the mapping from `other`'s ids to the imported ids. Events are
    /// suppressed during the copy and a single [`TaskEvent::ModelReset`] is
    /// fired at the end.
    pub fn import_data(&mut self, other: &TaskManager) -> HashMap<TaskId, TaskId> {
        let events_were_enabled = self.events_enabled();
        self.set_events_enabled(false);

        let mut mapping: HashMap<TaskId, TaskId> = HashMap::new();
        for original in other.hierarchy().deep_nested_tasks(ROOT_TASK_ID) {
            let Some(source) = other.task(original) else {
                continue;
            };
            let id = if self.tree.contains(original) {
                self.tree.allocate_id()
            } else {
                original
            };

            let mut copy = self.create_task_with_id(id);
            copy.copy_properties_from(source);

            let container = source
                .parent()
                .and_then(|parent| mapping.get(&parent).copied())
                .unwrap_or(ROOT_TASK_ID);
            if let Err(err) = self.insert_task(copy, container, None) {
                warn!("Skipping task {} during import: {}", original, err);
                continue;
            }
            mapping.insert(original, id);

            for (column, value) in source.custom_values() {
                if self.custom_columns.column(column).is_none() {
                    debug!("Column '{}' is unknown here, value of task {} dropped", column, original);
                    continue;
                }
                if let Err(err) = self.set_custom_value(id, column, value.clone()) {
                    warn!("Failed to import custom value of task {}: {}", original, err);
                }
            }
        }

        let mut imported_dependencies = 0;
        for dependency in other.dependencies().iter() {
            let (Some(&dependant), Some(&dependee)) = (
                mapping.get(&dependency.dependant()),
                mapping.get(&dependency.dependee()),
            ) else {
                continue;
            };
            match self.create_dependency_with(
                dependant,
                dependee,
                dependency.constraint,
                dependency.difference,
                dependency.hardness,
            ) {
                Ok(()) => imported_dependencies += 1,
                Err(err) => warn!("Failed to import dependency {} -> {}: {}", dependant, dependee, err),
            }
        }

        self.algorithms.adjust_all_bounds(&mut self.tree);
        self.recalculate_completion();
        self.set_events_enabled(events_were_enabled);
        if self.config.auto_recalculate {
            self.process_critical_path();
        }
        info!(
            "Imported {} tasks and {} dependencies",
            mapping.len(),
            imported_dependencies
        );
        self.fire(TaskEvent::ModelReset);
        mapping
    }

    /// Replays `other`'s resource assignments onto imported tasks.
    ///
    /// `task_mapping` is the result of [`import_data`](Self::import_data);
    /// `resource_mapping` translates `other`'s resources into this project's.
    /// Assignments to unmapped resources are skipped.
    pub fn import_assignments(
        &mut self,
        other: &TaskManager,
        task_mapping: &HashMap<TaskId, TaskId>,
        resource_mapping: &HashMap<ResourceId, ResourceId>,
    ) {
        for (&original, &imported) in task_mapping {
            let Some(source) = other.task(original) else {
                continue;
            };
            let mut assignments = Vec::new();
            for assignment in &source.assignments {
                let Some(&resource_id) = resource_mapping.get(&assignment.resource_id) else {
                    warn!(
                        "Resource {} of task {} has no counterpart, assignment skipped",
                        assignment.resource_id, original
                    );
                    continue;
                };
                assignments.push(ResourceAssignment {
                    resource_id,
                    load: assignment.load,
                    coordinator: assignment.coordinator,
                });
            }
            if assignments.is_empty() {
                continue;
            }
            if let Some(target) = self.tree.get_mut(imported) {
                target.assignments.extend(assignments);
                self.fire(TaskEvent::TaskPropertiesChanged(imported));
            }
        }
    }
}
