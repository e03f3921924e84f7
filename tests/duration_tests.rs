use schedule_engine::{DurationParseError, TaskLength, TimeUnit, TimeUnitStack};

fn parse(text: &str) -> Result<TaskLength, DurationParseError> {
    TaskLength::parse(text, &TimeUnitStack::default())
}

#[test]
fn single_pairs() {
    assert_eq!(parse("3d").unwrap(), TaskLength::days(3));
    assert_eq!(parse("8h").unwrap(), TaskLength::hours(8));
    assert_eq!(parse("2w").unwrap(), TaskLength::new(TimeUnit::Week, 2.0));
    assert_eq!(parse("1mo").unwrap(), TaskLength::new(TimeUnit::Month, 1.0));
}

#[test]
fn bare_number_counts_as_days() {
    assert_eq!(parse("5").unwrap(), TaskLength::days(5));
    assert_eq!(parse("2d 3").unwrap(), TaskLength::days(5));
}

#[test]
fn week_and_hours_sum_in_hours() {
    assert_eq!(parse("1w 4h").unwrap(), TaskLength::hours(172));
}

#[test]
fn malformed_input_reports_position_or_token() {
    assert_eq!(parse("d2"), Err(DurationParseError::DigitExpected { position: 0 }));
    assert_eq!(parse("3x"), Err(DurationParseError::UnknownUnit("x".into())));
    assert!(matches!(
        parse("2h 1mo"),
        Err(DurationParseError::IncompatibleUnits { .. })
    ));
}

#[test]
fn custom_unit_codes() {
    let units = TimeUnitStack {
        hour_code: "hr".into(),
        day_code: "day".into(),
        ..TimeUnitStack::default()
    };
    assert!(units.validate().is_ok());
    assert_eq!(TaskLength::parse("1day 2hr", &units).unwrap(), TaskLength::hours(26));
    assert_eq!(TaskLength::hours(26).encode(&units), "26hr");
    assert_eq!(
        TaskLength::parse("1h", &units),
        Err(DurationParseError::UnknownUnit("h".into()))
    );
}

#[test]
fn duplicate_unit_codes_are_invalid() {
    let units = TimeUnitStack {
        week_code: "d".into(),
        ..TimeUnitStack::default()
    };
    assert!(units.validate().is_err());
}

#[test]
fn conversion_between_regular_units() {
    let week = TaskLength::new(TimeUnit::Week, 1.0);
    assert_eq!(week.convert_to(TimeUnit::Day), Some(TaskLength::days(7)));
    assert_eq!(TaskLength::hours(48).length_in(TimeUnit::Day), Some(2.0));
    assert_eq!(TaskLength::days(1).convert_to(TimeUnit::Month), None);
}

#[test]
fn encoded_length_parses_back() {
    let units = TimeUnitStack::default();
    let length = parse("2d 4h").unwrap();
    let encoded = length.encode(&units);
    assert_eq!(encoded, "52h");
    assert_eq!(TaskLength::parse(&encoded, &units).unwrap(), length);
    assert_eq!(parse("3").unwrap(), TaskLength::days(3));
    assert_eq!(parse("abc"), Err(DurationParseError::DigitExpected { position: 0 }));
}
