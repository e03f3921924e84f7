use crate::duration::TaskLength;
use crate::error::ConfigError;
use crate::time_unit::TimeUnit;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Longest run of non-working days a shift will walk through before giving up.
const MAX_NON_WORKING_RUN: u32 = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
}

/// Working-time calendar consumed by the scheduling algorithms.
///
/// Implementors only need to classify days; shifting and snapping are
/// provided on top of [`is_working_day`](WorkingCalendar::is_working_day).
/// A working day contributes twenty-four hours of working time.
pub trait WorkingCalendar {
    fn is_working_day(&self, date: NaiveDate) -> bool;

    /// Moves `input` by `shift` of working time, skipping non-working days.
    fn shift_date(
        &self,
        input: NaiveDateTime,
        shift: &TaskLength,
        direction: MoveDirection,
    ) -> NaiveDateTime {
        match shift.length_in(TimeUnit::Hour) {
            Some(hours) => {
                let minutes = (hours * 60.0).round() as i64;
                match direction {
                    MoveDirection::Forward => walk_forward(self, input, Duration::minutes(minutes)),
                    MoveDirection::Backward => {
                        walk_backward(self, input, Duration::minutes(minutes))
                    }
                }
            }
            None => {
                let months = Months::new(shift.length().round() as u32);
                let moved = match direction {
                    MoveDirection::Forward => input.checked_add_months(months),
                    MoveDirection::Backward => input.checked_sub_months(months),
                };
                self.find_closest_working_time(moved.unwrap_or(input))
            }
        }
    }

    /// `time` itself when it falls on a working day, otherwise the start of
    /// the next working day.
    fn find_closest_working_time(&self, time: NaiveDateTime) -> NaiveDateTime {
        let mut date = time.date();
        if self.is_working_day(date) {
            return time;
        }
        for _ in 0..MAX_NON_WORKING_RUN {
            date = date + Duration::days(1);
            if self.is_working_day(date) {
                return midnight(date);
            }
        }
        time
    }

    /// Amount of working time in `[start, end)`, in whole days when possible.
    fn working_time_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> TaskLength {
        if end <= start {
            return TaskLength::zero(TimeUnit::Day);
        }
        let mut total = Duration::zero();
        let mut cursor = start;
        while cursor < end {
            let day_end = midnight(cursor.date() + Duration::days(1)).min(end);
            if self.is_working_day(cursor.date()) {
                total += day_end - cursor;
            }
            cursor = day_end;
        }
        let minutes = total.num_minutes();
        if minutes % (24 * 60) == 0 {
            TaskLength::new(TimeUnit::Day, (minutes / (24 * 60)) as f64)
        } else {
            TaskLength::new(TimeUnit::Hour, minutes as f64 / 60.0)
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn walk_forward<C: WorkingCalendar + ?Sized>(
    calendar: &C,
    input: NaiveDateTime,
    mut remaining: Duration,
) -> NaiveDateTime {
    let mut cursor = input;
    let mut idle_days = 0;
    while remaining > Duration::zero() {
        let day_end = midnight(cursor.date() + Duration::days(1));
        if !calendar.is_working_day(cursor.date()) {
            idle_days += 1;
            if idle_days > MAX_NON_WORKING_RUN {
                break;
            }
            cursor = day_end;
            continue;
        }
        idle_days = 0;
        let available = day_end - cursor;
        if remaining <= available {
            return cursor + remaining;
        }
        remaining -= available;
        cursor = day_end;
    }
    cursor
}

fn walk_backward<C: WorkingCalendar + ?Sized>(
    calendar: &C,
    input: NaiveDateTime,
    mut remaining: Duration,
) -> NaiveDateTime {
    let mut cursor = input;
    let mut idle_days = 0;
    while remaining > Duration::zero() {
        // The day holding the instant just before the cursor.
        let day = if cursor.time() == NaiveTime::MIN {
            cursor.date() - Duration::days(1)
        } else {
            cursor.date()
        };
        let day_start = midnight(day);
        if !calendar.is_working_day(day) {
            idle_days += 1;
            if idle_days > MAX_NON_WORKING_RUN {
                break;
            }
            cursor = day_start;
            continue;
        }
        idle_days = 0;
        let available = cursor - day_start;
        if remaining <= available {
            return cursor - remaining;
        }
        remaining -= available;
        cursor = day_start;
    }
    cursor
}

/// Calendar where every day is a working day.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysWorkingCalendar;

impl WorkingCalendar for AlwaysWorkingCalendar {
    fn is_working_day(&self, _date: NaiveDate) -> bool {
        true
    }
}

/// Weekday-and-holiday calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkingCalendar for WorkCalendar {
    fn is_working_day(&self, date: NaiveDate) -> bool {
        self.is_available(date)
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Mon-Fri week with US federal holidays for the given years (inclusive).
    pub fn with_us_holidays(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self::default();
        for year in start..=end {
            calendar.add_us_holidays(year);
        }
        calendar
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    fn add_us_holidays(&mut self, year: i32) {
        let fixed = [(1, 1), (7, 4), (11, 11), (12, 25)];
        for (month, day) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }

        // MLK, Presidents', Labor, Columbus, Thanksgiving
        let floating = [
            (1, Weekday::Mon, 3),
            (2, Weekday::Mon, 3),
            (9, Weekday::Mon, 1),
            (10, Weekday::Mon, 2),
            (11, Weekday::Thu, 4),
        ];
        for (month, weekday, n) in floating {
            if let Some(date) = NaiveDate::from_weekday_of_month_opt(year, month, weekday, n) {
                self.holidays.insert(date);
            }
        }

        // Memorial Day
        if let Some(date) = Self::last_weekday(year, 5, Weekday::Mon) {
            self.holidays.insert(date);
        }
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let mut date = first_of_next.pred_opt()?;
        while date.weekday() != weekday {
            date = date.pred_opt()?;
        }
        Some(date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Example: Dec 24 for 2025-2030.
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: &[Weekday]) {
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_days.is_empty() {
            return Err(ConfigError::Invalid(
                "calendar requires at least one working day".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day));
        WorkCalendarConfig::new(working, calendar.holidays.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn shift_forward_skips_weekend() {
        let cal = WorkCalendar::default();
        // Thu 2025-01-09 + 2 days = Sat 00:00 (end of Friday)
        assert_eq!(
            cal.shift_date(at(2025, 1, 9, 0), &TaskLength::days(2), MoveDirection::Forward),
            at(2025, 1, 11, 0)
        );
        // Thu + 3 days runs through the weekend into Monday
        assert_eq!(
            cal.shift_date(at(2025, 1, 9, 0), &TaskLength::days(3), MoveDirection::Forward),
            at(2025, 1, 14, 0)
        );
    }

    #[test]
    fn shift_backward_is_inverse_over_weekend() {
        let cal = WorkCalendar::default();
        assert_eq!(
            cal.shift_date(at(2025, 1, 14, 0), &TaskLength::days(3), MoveDirection::Backward),
            at(2025, 1, 9, 0)
        );
    }

    #[test]
    fn shift_by_hours_stays_inside_day() {
        let cal = WorkCalendar::default();
        assert_eq!(
            cal.shift_date(at(2025, 1, 6, 0), &TaskLength::hours(30), MoveDirection::Forward),
            at(2025, 1, 7, 6)
        );
    }

    #[test]
    fn closest_working_time_moves_off_weekend() {
        let cal = WorkCalendar::default();
        assert_eq!(cal.find_closest_working_time(at(2025, 1, 11, 0)), at(2025, 1, 13, 0));
        assert_eq!(cal.find_closest_working_time(at(2025, 1, 10, 5)), at(2025, 1, 10, 5));
    }

    #[test]
    fn working_time_between_counts_only_workdays() {
        let cal = WorkCalendar::default();
        assert_eq!(
            cal.working_time_between(at(2025, 1, 9, 0), at(2025, 1, 14, 0)),
            TaskLength::days(3)
        );
        assert_eq!(
            cal.working_time_between(at(2025, 1, 6, 0), at(2025, 1, 6, 6)),
            TaskLength::hours(6)
        );
    }

    #[test]
    fn config_roundtrip_keeps_working_days() {
        let mut cal = WorkCalendar::default();
        cal.set_working_days(&[Weekday::Mon, Weekday::Tue]);
        let rebuilt = WorkCalendar::from_config(&cal.to_config()).unwrap();
        assert_eq!(rebuilt, cal);
    }

    #[test]
    fn empty_working_week_is_rejected() {
        let config = WorkCalendarConfig::new(Vec::new(), Vec::new());
        assert!(WorkCalendar::from_config(&config).is_err());
    }
}
