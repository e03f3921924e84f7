use crate::custom_property::CustomValues;
use crate::duration::TaskLength;
use crate::resource::ResourceAssignment;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type TaskId = i32;

/// Id of the synthetic root every top-level task hangs under.
pub const ROOT_TASK_ID: TaskId = -1;

pub const DEFAULT_TASK_COLOR: &str = "#8cb6ce";

/// How the optional secondary ("third") date constrains a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThirdDateConstraint {
    #[default]
    None,
    EarliestBegin,
}

/// A node of the task tree.
///
/// The span is `[start, end)`; `end` is derived from `start` and the
/// duration through the owning manager's calendar and is refreshed by the
/// manager whenever the schedule changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    pub name: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration: TaskLength,
    pub milestone: bool,
    completion_percentage: u8,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    critical: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_info: Option<serde_json::Value>,
    pub expand: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub third_date_constraint: ThirdDateConstraint,
    #[serde(default)]
    pub(crate) custom_values: CustomValues,
    #[serde(default)]
    pub assignments: Vec<ResourceAssignment>,
    pub(crate) parent: Option<TaskId>,
    pub(crate) children: Vec<TaskId>,
}

impl Task {
    /// A one-day task starting at `start`, attached nowhere.
    pub fn new(id: TaskId, start: NaiveDateTime) -> Self {
        let duration = TaskLength::days(1);
        Self {
            id,
            name: String::new(),
            start,
            end: start + chrono::Duration::days(1),
            duration,
            milestone: false,
            completion_percentage: 0,
            color: DEFAULT_TASK_COLOR.to_string(),
            shape: None,
            critical: false,
            notes: String::new(),
            task_info: None,
            expand: true,
            third_date: None,
            third_date_constraint: ThirdDateConstraint::None,
            custom_values: CustomValues::new(),
            assignments: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> TaskLength {
        self.duration
    }

    /// Duration the calendar shifts by; milestones take no time.
    pub fn effective_duration(&self) -> TaskLength {
        if self.milestone {
            TaskLength::zero(self.duration.unit())
        } else {
            self.duration
        }
    }

    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn custom_values(&self) -> &CustomValues {
        &self.custom_values
    }

    /// The manager recomputes `end` once the change is committed.
    pub fn set_start(&mut self, start: NaiveDateTime) {
        self.start = start;
    }

    pub fn set_duration(&mut self, duration: TaskLength) {
        self.duration = duration;
    }

    /// Values above 100 are clamped.
    pub fn set_completion_percentage(&mut self, percentage: u8) {
        self.completion_percentage = percentage.min(100);
    }

    pub(crate) fn set_id(&mut self, id: TaskId) {
        self.id = id;
    }

    pub(crate) fn set_end(&mut self, end: NaiveDateTime) {
        self.end = end;
    }

    /// Assigns a span without going through the calendar, used by bound
    /// adjustment where both ends are already known.
    pub(crate) fn set_span(&mut self, start: NaiveDateTime, end: NaiveDateTime, duration: TaskLength) {
        self.start = start;
        self.end = end;
        self.duration = duration;
    }

    pub(crate) fn set_critical(&mut self, critical: bool) {
        self.critical = critical;
    }

    /// Copies every user-visible attribute of `other` except identity and structure.
    pub(crate) fn copy_properties_from(&mut self, other: &Task) {
        self.name = other.name.clone();
        self.start = other.start;
        self.end = other.end;
        self.duration = other.duration;
        self.milestone = other.milestone;
        self.completion_percentage = other.completion_percentage;
        self.color = other.color.clone();
        self.shape = other.shape.clone();
        self.notes = other.notes.clone();
        self.task_info = other.task_info.clone();
        self.expand = other.expand;
        self.third_date = other.third_date;
        self.third_date_constraint = other.third_date_constraint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn new_task_has_defaults() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let task = Task::new(3, start);
        assert_eq!(task.id(), 3);
        assert_eq!(task.duration(), TaskLength::days(1));
        assert_eq!(task.completion_percentage(), 0);
        assert_eq!(task.color, DEFAULT_TASK_COLOR);
        assert!(task.parent().is_none());
        assert!(!task.is_critical());
    }

    #[test]
    fn completion_is_clamped() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut task = Task::new(1, start);
        task.set_completion_percentage(250);
        assert_eq!(task.completion_percentage(), 100);
    }

    #[test]
    fn milestone_takes_no_time() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut task = Task::new(1, start);
        task.milestone = true;
        assert!(task.effective_duration().is_zero());
    }
}
