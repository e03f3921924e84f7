use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity a [`TaskLength`](crate::TaskLength) is expressed in.
///
/// `Hour`, `Day` and `Week` form a regular chain (a week is built from seven
/// days, a day from twenty-four hours). `Month` is calendar dependent and is
/// not constructed from any other unit, so it never mixes with the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [TimeUnit::Hour, TimeUnit::Day, TimeUnit::Week, TimeUnit::Month];

    /// Size in hours for units with a fixed size.
    pub fn atom_hours(self) -> Option<u32> {
        match self {
            TimeUnit::Hour => Some(1),
            TimeUnit::Day => Some(24),
            TimeUnit::Week => Some(24 * 7),
            TimeUnit::Month => None,
        }
    }

    /// Nominal size in hours, used where an approximate weight is enough
    /// (completion rollup). Months count as thirty days.
    pub fn nominal_hours(self) -> f64 {
        match self.atom_hours() {
            Some(hours) => f64::from(hours),
            None => 30.0 * 24.0,
        }
    }

    /// True when `self` is a whole multiple of `finer`.
    pub fn is_constructed_from(self, finer: TimeUnit) -> bool {
        match (self.atom_hours(), finer.atom_hours()) {
            (Some(coarse), Some(fine)) => coarse > fine && coarse % fine == 0,
            _ => false,
        }
    }

    /// How many `target` units make up one `self` unit, when both are regular.
    pub fn ratio_to(self, target: TimeUnit) -> Option<f64> {
        let from = self.atom_hours()?;
        let to = target.atom_hours()?;
        Some(f64::from(from) / f64::from(to))
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Table of textual unit codes used by the duration parser and encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeUnitStack {
    pub hour_code: String,
    pub day_code: String,
    pub week_code: String,
    pub month_code: String,
}

impl Default for TimeUnitStack {
    fn default() -> Self {
        Self {
            hour_code: "h".to_string(),
            day_code: "d".to_string(),
            week_code: "w".to_string(),
            month_code: "mo".to_string(),
        }
    }
}

impl TimeUnitStack {
    /// Unit a bare number without a code is read as.
    pub fn default_unit(&self) -> TimeUnit {
        TimeUnit::Day
    }

    pub fn find_time_unit(&self, code: &str) -> Option<TimeUnit> {
        TimeUnit::ALL
            .into_iter()
            .find(|unit| self.encode(*unit) == code)
    }

    pub fn encode(&self, unit: TimeUnit) -> &str {
        match unit {
            TimeUnit::Hour => &self.hour_code,
            TimeUnit::Day => &self.day_code,
            TimeUnit::Week => &self.week_code,
            TimeUnit::Month => &self.month_code,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let codes: Vec<&str> = TimeUnit::ALL.iter().map(|unit| self.encode(*unit)).collect();
        for (idx, code) in codes.iter().enumerate() {
            if code.is_empty() || !code.chars().all(char::is_alphabetic) {
                return Err(ConfigError::Invalid(format!(
                    "time unit code '{code}' must be a non-empty run of letters"
                )));
            }
            if codes[..idx].contains(code) {
                return Err(ConfigError::Invalid(format!(
                    "time unit code '{code}' is used twice"
                )));
            }
        }
        Ok(())
    }
}
