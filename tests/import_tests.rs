use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use schedule_engine::{
    ConstraintType, CustomColumn, CustomPropertyType, CustomValue, Hardness, ROOT_TASK_ID,
    RecordingEventSink, ResourceAssignment, TaskEvent, TaskId, TaskLength, TaskManager,
    TaskManagerConfig,
};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn config() -> TaskManagerConfig {
    TaskManagerConfig {
        project_start: Some(at(2025, 1, 6)),
        ..TaskManagerConfig::default()
    }
}

fn add(manager: &mut TaskManager, container: TaskId, name: &str, days: u32) -> TaskId {
    let mut task = manager.create_task();
    task.name = name.to_string();
    task.set_duration(TaskLength::days(days));
    manager.insert_task(task, container, None).unwrap()
}

#[test]
fn imports_tasks_and_dependencies() {
    let mut source = TaskManager::new(config()).unwrap();
    let a = add(&mut source, ROOT_TASK_ID, "A", 2);
    let b = add(&mut source, ROOT_TASK_ID, "B", 1);
    source
        .create_dependency_with(b, a, ConstraintType::FinishStart, 1, Hardness::Rigid)
        .unwrap();

    let mut target = TaskManager::new(config()).unwrap();
    let mapping = target.import_data(&source);

    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping[&a], a);
    assert_eq!(mapping[&b], b);
    let imported = target.dependencies().get(mapping[&b], mapping[&a]).unwrap();
    assert_eq!(imported.constraint, ConstraintType::FinishStart);
    assert_eq!(imported.difference, 1);
    assert_eq!(imported.hardness, Hardness::Rigid);

    let b_task = target.task(mapping[&b]).unwrap();
    assert_eq!(b_task.name, "B");
    assert_eq!(b_task.start(), at(2025, 1, 9));
}

#[test]
fn colliding_ids_are_reassigned_and_nesting_kept() {
    let mut source = TaskManager::new(config()).unwrap();
    let container = add(&mut source, ROOT_TASK_ID, "Phase", 1);
    let nested = add(&mut source, container, "Step", 3);

    let mut target = TaskManager::new(config()).unwrap();
    let existing = add(&mut target, ROOT_TASK_ID, "Existing", 1);
    let mapping = target.import_data(&source);

    assert_ne!(mapping[&container], existing);
    assert_eq!(target.task_count(), 3);
    let new_container = mapping[&container];
    let new_nested = mapping[&nested];
    assert_eq!(target.task(new_nested).unwrap().parent(), Some(new_container));
    assert_eq!(target.root().children(), &[existing, new_container]);
    assert_eq!(
        target.task(new_container).unwrap().end(),
        target.task(new_nested).unwrap().end()
    );

    // later ids stay clear of everything imported
    let fresh = target.create_task();
    assert!(!target.tree().contains(fresh.id()));
    assert!(mapping.values().all(|id| *id != fresh.id()));
}

#[test]
fn import_fires_single_reset_event() {
    let mut source = TaskManager::new(config()).unwrap();
    add(&mut source, ROOT_TASK_ID, "A", 1);
    add(&mut source, ROOT_TASK_ID, "B", 1);

    let sink = RecordingEventSink::new();
    let mut target = TaskManager::with_event_sink(config(), Box::new(sink.clone())).unwrap();
    target.import_data(&source);

    assert_eq!(sink.events(), vec![TaskEvent::ModelReset]);
    assert!(target.events_enabled());
}

#[test]
fn custom_values_follow_known_columns_only() {
    let mut source = TaskManager::new(config()).unwrap();
    for column in [
        CustomColumn::new("cost", CustomPropertyType::Double),
        CustomColumn::new("owner", CustomPropertyType::Text),
    ] {
        source.custom_columns_mut().add_column(column).unwrap();
    }
    let a = add(&mut source, ROOT_TASK_ID, "A", 1);
    source.set_custom_value(a, "cost", CustomValue::Double(10.5)).unwrap();
    source
        .set_custom_value(a, "owner", CustomValue::Text("kim".into()))
        .unwrap();

    let mut target = TaskManager::new(config()).unwrap();
    target
        .custom_columns_mut()
        .add_column(CustomColumn::new("cost", CustomPropertyType::Double))
        .unwrap();
    let mapping = target.import_data(&source);

    let values = target.task(mapping[&a]).unwrap().custom_values();
    assert_eq!(values.get("cost"), Some(&CustomValue::Double(10.5)));
    assert!(values.get("owner").is_none());
}

#[test]
fn assignments_are_remapped() {
    let mut source = TaskManager::new(config()).unwrap();
    let a = add(&mut source, ROOT_TASK_ID, "A", 1);
    source
        .update_task(a, |task| {
            task.assignments.push(ResourceAssignment {
                resource_id: 7,
                load: 50.0,
                coordinator: true,
            });
            task.assignments.push(ResourceAssignment::new(8, 100.0));
        })
        .unwrap();

    let mut target = TaskManager::new(config()).unwrap();
    let task_mapping = target.import_data(&source);
    let resource_mapping = HashMap::from([(7, 70)]);
    target.import_assignments(&source, &task_mapping, &resource_mapping);

    let assignments = &target.task(task_mapping[&a]).unwrap().assignments;
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].resource_id, 70);
    assert_eq!(assignments[0].load, 50.0);
    assert!(assignments[0].coordinator);
}
