use chrono::{NaiveDate, NaiveDateTime};
use schedule_engine::{
    ConstraintType, CustomColumn, CustomPropertyError, CustomPropertyType, CustomValue,
    RecordingEventSink, ROOT_TASK_ID, TaskEvent, TaskId, TaskLength, TaskManager,
    TaskManagerConfig, TaskTreeError,
};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn config() -> TaskManagerConfig {
    TaskManagerConfig {
        // Monday
        project_start: Some(at(2025, 1, 6)),
        ..TaskManagerConfig::default()
    }
}

fn manager() -> TaskManager {
    TaskManager::new(config()).unwrap()
}

fn add(manager: &mut TaskManager, container: TaskId, days: u32) -> TaskId {
    let mut task = manager.create_task();
    task.set_duration(TaskLength::days(days));
    manager.insert_task(task, container, None).unwrap()
}

#[test]
fn created_task_is_not_registered_until_asked() {
    let mut manager = manager();
    let task = manager.create_task();
    assert_eq!(task.id(), 0);
    assert!(manager.task(0).is_none());

    manager.register_task(task);
    assert!(manager.task(0).is_some());
    assert!(manager.task(0).unwrap().parent().is_none());
    assert_eq!(manager.create_task().id(), 1);
}

#[test]
fn explicit_ids_push_the_counter_forward() {
    let mut manager = manager();
    let task = manager.create_task_with_id(41);
    manager.register_task(task);
    assert_eq!(manager.create_task().id(), 42);

    // lower explicit ids do not rewind it
    let low = manager.create_task_with_id(3);
    manager.register_task(low);
    assert_eq!(manager.create_task().id(), 43);
}

#[test]
#[should_panic(expected = "already has the ID 5")]
fn registering_same_id_twice_panics() {
    let mut manager = manager();
    let first = manager.create_task_with_id(5);
    manager.register_task(first);
    let second = manager.create_task_with_id(5);
    manager.register_task(second);
}

#[test]
fn new_task_defaults_follow_config() {
    let mut manager = manager();
    let task = manager.create_task();
    assert_eq!(task.start(), at(2025, 1, 6));
    assert_eq!(task.end(), at(2025, 1, 7));
    assert_eq!(task.color, "#8cb6ce");
    assert_eq!(manager.default_task_name(task.id()), "New task 0");
}

#[test]
fn delete_removes_subtree_and_its_dependencies() {
    let mut manager = manager();
    let container = add(&mut manager, ROOT_TASK_ID, 1);
    let nested = add(&mut manager, container, 1);
    let deeper = add(&mut manager, nested, 1);
    let other = add(&mut manager, ROOT_TASK_ID, 1);
    manager
        .create_dependency(other, deeper, ConstraintType::FinishStart)
        .unwrap();

    let removed = manager.delete_task(container).unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(manager.task_count(), 1);
    assert!(manager.dependencies().is_empty());
    assert_eq!(manager.root().children(), &[other]);
    assert_eq!(manager.delete_task(container), Err(TaskTreeError::UnknownTask(container)));
}

#[test]
fn deleting_the_last_task_moves_the_critical_path() {
    let mut manager = manager();
    let long = add(&mut manager, ROOT_TASK_ID, 5);
    let short = add(&mut manager, ROOT_TASK_ID, 1);
    assert!(manager.task(long).unwrap().is_critical());
    assert!(!manager.task(short).unwrap().is_critical());

    manager.delete_task(long).unwrap();
    assert!(manager.task(short).unwrap().is_critical());
}

#[test]
fn snapshot_follows_document_order() {
    let mut manager = manager();
    let a = add(&mut manager, ROOT_TASK_ID, 1);
    let b = add(&mut manager, ROOT_TASK_ID, 1);
    let a1 = add(&mut manager, a, 1);
    assert_eq!(manager.task_ids(), &[a, a1, b]);

    manager.move_task(b, ROOT_TASK_ID, Some(0)).unwrap();
    assert_eq!(manager.task_ids(), &[b, a, a1]);
    let names: Vec<TaskId> = manager.tasks().iter().map(|t| t.id()).collect();
    assert_eq!(names, vec![b, a, a1]);
}

#[test]
fn move_rejects_own_descendant() {
    let mut manager = manager();
    let a = add(&mut manager, ROOT_TASK_ID, 1);
    let a1 = add(&mut manager, a, 1);
    assert_eq!(
        manager.move_task(a, a1, None),
        Err(TaskTreeError::WouldCreateCycle { task: a, target: a1 })
    );
    assert_eq!(manager.move_task(ROOT_TASK_ID, a, None), Err(TaskTreeError::RootNotMovable));
}

#[test]
fn unregistered_task_is_placed_through_insert() {
    let mut manager = manager();
    let container = add(&mut manager, ROOT_TASK_ID, 1);
    let task = manager.create_task();
    let id = task.id();
    assert_eq!(
        manager.move_task(id, container, None),
        Err(TaskTreeError::UnknownTask(id))
    );

    manager.insert_task(task, container, None).unwrap();
    assert_eq!(manager.task(id).unwrap().parent(), Some(container));
}

#[test]
fn moving_out_shrinks_old_container() {
    let mut manager = manager();
    let container = add(&mut manager, ROOT_TASK_ID, 1);
    let short = add(&mut manager, container, 1);
    let long = add(&mut manager, container, 3);
    assert_eq!(manager.task(container).unwrap().end(), at(2025, 1, 9));

    manager.move_task(long, ROOT_TASK_ID, None).unwrap();
    let container_task = manager.task(container).unwrap();
    assert_eq!(container_task.end(), manager.task(short).unwrap().end());
    assert_eq!(container_task.duration(), TaskLength::days(1));
}

#[test]
fn update_task_recomputes_end_and_fires_schedule_event() {
    let sink = RecordingEventSink::new();
    let mut manager = TaskManager::with_event_sink(config(), Box::new(sink.clone())).unwrap();
    let id = add(&mut manager, ROOT_TASK_ID, 1);
    sink.take();

    // three working days from Fri 10 end at the start of Wed 15
    manager
        .update_task(id, |task| {
            task.set_start(at(2025, 1, 10));
            task.set_duration(TaskLength::days(3));
        })
        .unwrap();
    let task = manager.task(id).unwrap();
    assert_eq!(task.end(), at(2025, 1, 15));
    assert!(sink.events().contains(&TaskEvent::TaskScheduleChanged {
        task: id,
        old_start: at(2025, 1, 6),
        old_end: at(2025, 1, 7),
        new_start: at(2025, 1, 10),
        new_end: at(2025, 1, 15),
    }));

    sink.take();
    manager.update_task(id, |task| task.name = "Design".into()).unwrap();
    assert_eq!(sink.take(), vec![TaskEvent::TaskPropertiesChanged(id)]);
}

#[test]
fn progress_change_rolls_up_and_notifies() {
    let sink = RecordingEventSink::new();
    let mut manager = TaskManager::with_event_sink(config(), Box::new(sink.clone())).unwrap();
    let container = add(&mut manager, ROOT_TASK_ID, 1);
    let done = add(&mut manager, container, 2);
    add(&mut manager, container, 2);
    sink.take();

    manager
        .update_task(done, |task| task.set_completion_percentage(100))
        .unwrap();
    assert_eq!(manager.task(container).unwrap().completion_percentage(), 50);
    assert_eq!(manager.project_completion(), 50);
    assert!(sink.events().contains(&TaskEvent::TaskProgressChanged(done)));
}

#[test]
fn disabled_events_are_dropped() {
    let sink = RecordingEventSink::new();
    let mut manager = TaskManager::with_event_sink(config(), Box::new(sink.clone())).unwrap();
    manager.set_events_enabled(false);
    add(&mut manager, ROOT_TASK_ID, 1);
    assert!(sink.events().is_empty());

    manager.set_events_enabled(true);
    let id = add(&mut manager, ROOT_TASK_ID, 1);
    assert_eq!(sink.events()[0], TaskEvent::TaskAdded(id));
}

#[test]
fn custom_values_are_validated_against_columns() {
    let mut manager = manager();
    let id = add(&mut manager, ROOT_TASK_ID, 1);
    manager
        .custom_columns_mut()
        .add_column(CustomColumn::new("budget", CustomPropertyType::Integer))
        .unwrap();

    manager
        .set_custom_value(id, "budget", CustomValue::Integer(1200))
        .unwrap();
    assert_eq!(
        manager.task(id).unwrap().custom_values().get("budget"),
        Some(&CustomValue::Integer(1200))
    );
    assert!(matches!(
        manager.set_custom_value(id, "budget", CustomValue::Boolean(true)),
        Err(CustomPropertyError::TypeMismatch { .. })
    ));
    assert_eq!(
        manager.set_custom_value(99, "budget", CustomValue::Integer(1)),
        Err(CustomPropertyError::UnknownTask(99))
    );
}

#[test]
fn missing_custom_value_falls_back_to_column_default() {
    let mut manager = manager();
    let id = add(&mut manager, ROOT_TASK_ID, 1);
    manager
        .custom_columns_mut()
        .add_column(CustomColumn {
            default_value: Some(CustomValue::Text("open".into())),
            ..CustomColumn::new("status", CustomPropertyType::Text)
        })
        .unwrap();
    manager
        .custom_columns_mut()
        .add_column(CustomColumn::new("owner", CustomPropertyType::Text))
        .unwrap();

    assert_eq!(
        manager.custom_value(id, "status"),
        Some(&CustomValue::Text("open".into()))
    );
    assert_eq!(manager.custom_value(id, "owner"), None);

    manager
        .set_custom_value(id, "status", CustomValue::Text("done".into()))
        .unwrap();
    assert_eq!(
        manager.custom_value(id, "status"),
        Some(&CustomValue::Text("done".into()))
    );
    assert_eq!(manager.custom_value(99, "status"), None);
}

#[test]
fn project_closed_resets_everything() {
    let sink = RecordingEventSink::new();
    let mut manager = TaskManager::with_event_sink(config(), Box::new(sink.clone())).unwrap();
    let a = add(&mut manager, ROOT_TASK_ID, 1);
    let b = add(&mut manager, ROOT_TASK_ID, 1);
    manager.create_dependency(b, a, ConstraintType::FinishStart).unwrap();

    manager.project_closed();
    assert_eq!(manager.task_count(), 0);
    assert!(manager.dependencies().is_empty());
    assert!(manager.root().children().is_empty());
    assert_eq!(manager.create_task().id(), 0);
    assert_eq!(sink.events().last(), Some(&TaskEvent::ModelReset));
}

#[test]
fn empty_clone_keeps_columns_but_no_tasks() {
    let mut manager = manager();
    add(&mut manager, ROOT_TASK_ID, 1);
    manager
        .custom_columns_mut()
        .add_column(CustomColumn::new("owner", CustomPropertyType::Text))
        .unwrap();

    let clone = manager.empty_clone().unwrap();
    assert_eq!(clone.task_count(), 0);
    assert!(clone.custom_columns().column("owner").is_some());
    assert_eq!(clone.config(), manager.config());
}

#[test]
fn project_opened_refreshes_derived_state() {
    let sink = RecordingEventSink::new();
    let mut manager = TaskManager::with_event_sink(
        TaskManagerConfig {
            auto_recalculate: false,
            ..config()
        },
        Box::new(sink.clone()),
    )
    .unwrap();
    let a = add(&mut manager, ROOT_TASK_ID, 2);
    let b = add(&mut manager, ROOT_TASK_ID, 1);
    manager.create_dependency(b, a, ConstraintType::FinishStart).unwrap();
    manager
        .update_task(a, |task| task.set_completion_percentage(100))
        .unwrap();
    assert_eq!(manager.task(b).unwrap().start(), at(2025, 1, 6));
    assert!(!manager.task(a).unwrap().is_critical());

    manager.project_opened();
    assert_eq!(manager.task(b).unwrap().start(), at(2025, 1, 8));
    assert!(manager.task(a).unwrap().is_critical());
    assert!(manager.task(b).unwrap().is_critical());
    assert_eq!(manager.project_completion(), 67);
}
