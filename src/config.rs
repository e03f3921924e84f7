use crate::calendar::WorkCalendarConfig;
use crate::error::ConfigError;
use crate::task::DEFAULT_TASK_COLOR;
use crate::time_unit::TimeUnitStack;
use chrono::{Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskManagerConfig {
    pub task_name_prefix: String,
    pub default_color: String,
    pub time_units: TimeUnitStack,
    pub calendar: WorkCalendarConfig,
    /// Run schedule propagation and the critical path after schedule edits.
    pub auto_recalculate: bool,
    /// Start of the synthetic root; today at midnight when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_start: Option<NaiveDateTime>,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            task_name_prefix: "New task".to_string(),
            default_color: DEFAULT_TASK_COLOR.to_string(),
            time_units: TimeUnitStack::default(),
            calendar: WorkCalendarConfig::default(),
            auto_recalculate: true,
            project_start: None,
        }
    }
}

impl TaskManagerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.task_name_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("task name prefix must not be empty".into()));
        }
        self.time_units.validate()?;
        self.calendar.validate()
    }

    pub fn project_start(&self) -> NaiveDateTime {
        self.project_start
            .unwrap_or_else(|| Local::now().date_naive().and_time(NaiveTime::MIN))
    }
}
