//! Typed time quantities and the textual duration syntax (`"2d 4h"`, `"3w"`, `"5"`).

use crate::error::DurationParseError;
use crate::time_unit::{TimeUnit, TimeUnitStack};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable, non-negative amount of time expressed in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskLength {
    unit: TimeUnit,
    length: f64,
}

impl TaskLength {
    pub fn new(unit: TimeUnit, length: f64) -> Self {
        assert!(
            length.is_finite() && length >= 0.0,
            "task length must be a finite non-negative number, got {length}"
        );
        Self { unit, length }
    }

    pub fn zero(unit: TimeUnit) -> Self {
        Self::new(unit, 0.0)
    }

    pub fn days(count: u32) -> Self {
        Self::new(TimeUnit::Day, f64::from(count))
    }

    pub fn hours(count: u32) -> Self {
        Self::new(TimeUnit::Hour, f64::from(count))
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_zero(&self) -> bool {
        self.length == 0.0
    }

    /// Value of this length in `unit`, when the two units are convertible.
    pub fn length_in(&self, unit: TimeUnit) -> Option<f64> {
        if unit == self.unit {
            return Some(self.length);
        }
        self.unit.ratio_to(unit).map(|ratio| self.length * ratio)
    }

    pub fn convert_to(&self, unit: TimeUnit) -> Option<TaskLength> {
        self.length_in(unit).map(|length| TaskLength::new(unit, length))
    }

    /// Approximate size in hours; months count as thirty days.
    pub fn nominal_hours(&self) -> f64 {
        self.length * self.unit.nominal_hours()
    }

    /// Sum of two lengths, expressed in the finer of the two units.
    ///
    /// Returns `None` when neither unit is constructed from the other.
    pub fn checked_add(&self, other: &TaskLength) -> Option<TaskLength> {
        let target = if self.unit == other.unit || self.unit.is_constructed_from(other.unit) {
            other.unit
        } else if other.unit.is_constructed_from(self.unit) {
            self.unit
        } else {
            return None;
        };
        let lhs = self.length_in(target)?;
        let rhs = other.length_in(target)?;
        Some(TaskLength::new(target, lhs + rhs))
    }

    /// Magnitude immediately followed by the unit code, e.g. `"52h"`.
    pub fn encode(&self, units: &TimeUnitStack) -> String {
        format!("{}{}", format_magnitude(self.length), units.encode(self.unit))
    }

    /// Parses one or more `<number><code>` pairs separated by optional whitespace.
    ///
    /// Pairs whose units are convertible are summed into the finer unit. A
    /// trailing number without a code counts in the default unit (days).
    pub fn parse(text: &str, units: &TimeUnitStack) -> Result<TaskLength, DurationParseError> {
        DurationScanner::new(units).scan(text)
    }
}

impl fmt::Display for TaskLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_magnitude(self.length), self.unit)?;
        if self.length != 1.0 {
            f.write_str("s")?;
        }
        Ok(())
    }
}

fn format_magnitude(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ExpectNumber,
    Digits,
    UnitLetters,
}

struct DurationScanner<'a> {
    units: &'a TimeUnitStack,
    state: ScanState,
    buffer: String,
    pending: Option<u32>,
    total: Option<TaskLength>,
}

impl<'a> DurationScanner<'a> {
    fn new(units: &'a TimeUnitStack) -> Self {
        Self {
            units,
            state: ScanState::ExpectNumber,
            buffer: String::new(),
            pending: None,
            total: None,
        }
    }

    fn scan(mut self, text: &str) -> Result<TaskLength, DurationParseError> {
        // The extra space flushes whatever token is still open at the end.
        for (position, ch) in text.chars().chain(std::iter::once(' ')).enumerate() {
            if ch.is_ascii_digit() {
                self.on_digit(ch, position)?;
            } else if ch.is_whitespace() {
                self.on_whitespace()?;
            } else {
                self.on_letter(ch, position)?;
            }
        }
        if let Some(value) = self.pending.take() {
            let trailing = TaskLength::new(self.units.default_unit(), f64::from(value));
            self.accumulate(trailing)?;
        }
        self.total.ok_or(DurationParseError::Empty)
    }

    fn on_digit(&mut self, ch: char, position: usize) -> Result<(), DurationParseError> {
        match self.state {
            ScanState::ExpectNumber => {
                if self.pending.is_some() {
                    return Err(DurationParseError::UnitExpected { position });
                }
                self.start_token(ScanState::Digits, ch);
            }
            ScanState::Digits => self.buffer.push(ch),
            ScanState::UnitLetters => {
                self.close_unit(position)?;
                self.start_token(ScanState::Digits, ch);
            }
        }
        Ok(())
    }

    fn on_whitespace(&mut self) -> Result<(), DurationParseError> {
        match self.state {
            ScanState::ExpectNumber => {}
            ScanState::Digits => {
                self.pending = Some(self.read_number()?);
                self.state = ScanState::ExpectNumber;
            }
            ScanState::UnitLetters => {
                self.close_unit(0)?;
                self.state = ScanState::ExpectNumber;
            }
        }
        Ok(())
    }

    fn on_letter(&mut self, ch: char, position: usize) -> Result<(), DurationParseError> {
        match self.state {
            ScanState::Digits => {
                self.pending = Some(self.read_number()?);
                self.start_token(ScanState::UnitLetters, ch);
            }
            ScanState::ExpectNumber => {
                if self.pending.is_none() {
                    return Err(DurationParseError::DigitExpected { position });
                }
                self.start_token(ScanState::UnitLetters, ch);
            }
            ScanState::UnitLetters => self.buffer.push(ch),
        }
        Ok(())
    }

    fn start_token(&mut self, state: ScanState, first: char) {
        self.state = state;
        self.buffer.clear();
        self.buffer.push(first);
    }

    fn read_number(&self) -> Result<u32, DurationParseError> {
        self.buffer
            .parse::<u32>()
            .map_err(|_| DurationParseError::InvalidNumber(self.buffer.clone()))
    }

    fn close_unit(&mut self, position: usize) -> Result<(), DurationParseError> {
        let unit = self
            .units
            .find_time_unit(&self.buffer)
            .ok_or_else(|| DurationParseError::UnknownUnit(self.buffer.clone()))?;
        let value = self
            .pending
            .take()
            .ok_or(DurationParseError::DigitExpected { position })?;
        self.accumulate(TaskLength::new(unit, f64::from(value)))
    }

    fn accumulate(&mut self, next: TaskLength) -> Result<(), DurationParseError> {
        let combined = match self.total {
            None => next,
            Some(current) => current.checked_add(&next).ok_or_else(|| {
                DurationParseError::IncompatibleUnits {
                    first: self.units.encode(current.unit()).to_string(),
                    second: self.units.encode(next.unit()).to_string(),
                }
            })?,
        };
        self.total = Some(combined);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TaskLength, DurationParseError> {
        TaskLength::parse(text, &TimeUnitStack::default())
    }

    #[test]
    fn mixed_units_sum_into_finer_unit() {
        assert_eq!(parse("2d 4h").unwrap(), TaskLength::hours(52));
        assert_eq!(parse("2d4h").unwrap(), TaskLength::hours(52));
        assert_eq!(parse("4h 2d").unwrap(), TaskLength::hours(52));
        assert_eq!(parse("1w 2d").unwrap(), TaskLength::days(9));
    }

    #[test]
    fn space_between_number_and_code_is_allowed() {
        assert_eq!(parse("2 d").unwrap(), TaskLength::days(2));
    }

    #[test]
    fn two_numbers_without_unit_fail() {
        assert_eq!(
            parse("2 3"),
            Err(DurationParseError::UnitExpected { position: 2 })
        );
    }

    #[test]
    fn month_does_not_mix_with_days() {
        assert!(matches!(
            parse("1mo 2d"),
            Err(DurationParseError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn empty_and_blank_input_fail() {
        assert_eq!(parse(""), Err(DurationParseError::Empty));
        assert_eq!(parse("   "), Err(DurationParseError::Empty));
    }

    #[test]
    fn encode_uses_code_without_separator() {
        let units = TimeUnitStack::default();
        assert_eq!(TaskLength::hours(52).encode(&units), "52h");
        assert_eq!(TaskLength::new(TimeUnit::Day, 1.5).encode(&units), "1.5d");
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(TaskLength::days(1).to_string(), "1 day");
        assert_eq!(TaskLength::days(3).to_string(), "3 days");
    }
}
