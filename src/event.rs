use crate::task::TaskId;
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::rc::Rc;

/// Change notification fired by the manager after a mutation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    TaskAdded(TaskId),
    TaskRemoved(TaskId),
    TaskPropertiesChanged(TaskId),
    TaskProgressChanged(TaskId),
    TaskScheduleChanged {
        task: TaskId,
        old_start: NaiveDateTime,
        old_end: NaiveDateTime,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
    },
    DependencyAdded { dependant: TaskId, dependee: TaskId },
    DependencyRemoved { dependant: TaskId, dependee: TaskId },
    /// The whole model was replaced (project closed, bulk import finished).
    ModelReset,
}

/// Receiver of [`TaskEvent`]s, handed to the manager at construction.
///
/// Delivery is synchronous; a sink must not call back into the manager.
pub trait TaskEventSink {
    fn on_event(&mut self, event: &TaskEvent);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl TaskEventSink for NullEventSink {
    fn on_event(&mut self, _event: &TaskEvent) {}
}

/// Sink that keeps every event, shareable with the code that inspects it.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    events: Rc<RefCell<Vec<TaskEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<TaskEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl TaskEventSink for RecordingEventSink {
    fn on_event(&mut self, event: &TaskEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
