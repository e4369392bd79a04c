// Integration tests for rule evaluation, materialization and settings
mod fixtures;

use chrono::{Datelike, Weekday};
use date_recur::models::date_recur::DateRecurItem;
use date_recur::models::occurrence::{MaterializationRecord, StorageFormat};
use date_recur::models::settings::Settings;
use date_recur::services::materialize::{materialize, MaterializationPolicy};
use date_recur::services::recurrence::{
    parse_rule, RecurrenceError, RecurrenceRule, RuleParseError,
};
use date_recur::services::settings::SettingsService;
use fixtures::dates::{jan_1_2024_9am, utc};
use fixtures::rules;
use pretty_assertions::assert_eq;

fn rule(text: &str) -> RecurrenceRule {
    RecurrenceRule::new(text, jan_1_2024_9am(), None, "UTC").expect("valid rule")
}

#[test]
fn test_count_bound() {
    let starts: Vec<_> = rule(rules::DAILY_FIVE)
        .occurrences(None, None, None)
        .unwrap()
        .into_iter()
        .map(|o| o.start)
        .collect();

    assert_eq!(
        starts,
        (1..=5).map(|day| utc(2024, 1, day, 9, 0)).collect::<Vec<_>>()
    );
}

#[test]
fn test_until_bound_is_inclusive() {
    let starts: Vec<_> = rule(rules::DAILY_UNTIL)
        .occurrences(None, None, None)
        .unwrap()
        .into_iter()
        .map(|o| o.start)
        .collect();

    assert_eq!(
        starts,
        vec![utc(2024, 1, 1, 9, 0), utc(2024, 1, 2, 9, 0), utc(2024, 1, 3, 9, 0)]
    );
}

#[test]
fn test_interval_one_not_serialized() {
    let parsed = parse_rule("FREQ=DAILY;INTERVAL=1;COUNT=2").unwrap();
    assert!(!parsed.to_string().contains("INTERVAL"));
}

#[test]
fn test_first_monday_once_per_month() {
    let occurrences = rule(rules::FIRST_MONDAY)
        .occurrences(None, Some(utc(2024, 12, 31, 23, 59)), None)
        .unwrap();

    assert_eq!(occurrences.len(), 12);
    for (index, occurrence) in occurrences.iter().enumerate() {
        assert_eq!(occurrence.start.month() as usize, index + 1);
        assert_eq!(occurrence.start.weekday(), Weekday::Mon);
        assert!(occurrence.start.day() <= 7);
    }
}

#[test]
fn test_exdate_removes_exactly_that_instant() {
    let plain = rule(rules::DAILY_FIVE).occurrences(None, None, None).unwrap();
    let excluded = rule("RRULE:FREQ=DAILY;COUNT=5\nEXDATE:20240103T090000Z")
        .occurrences(None, None, None)
        .unwrap();

    let expected: Vec<_> = plain
        .into_iter()
        .filter(|o| o.start != utc(2024, 1, 3, 9, 0))
        .collect();
    assert_eq!(excluded, expected);
}

#[test]
fn test_infinite_detection() {
    let weekly = rule(rules::WEEKLY_FOREVER);
    assert!(weekly.is_infinite());
    assert_eq!(
        weekly.occurrences(None, None, None),
        Err(RecurrenceError::UnboundedEvaluation)
    );
    assert_eq!(
        weekly.occurrences(Some(utc(2024, 3, 1, 0, 0)), None, Some(2)).unwrap().len(),
        2
    );
    assert!(!rule(rules::QUARTERLY).is_infinite());
}

#[test]
fn test_malformed_input() {
    assert!(matches!(
        RecurrenceRule::new("FREQ=BOGUS", jan_1_2024_9am(), None, "UTC"),
        Err(RecurrenceError::InvalidRule(_))
    ));
    assert_eq!(
        parse_rule("FREQ=DAILY;COUNT=3;UNTIL=20240105T000000Z"),
        Err(RuleParseError::ConflictingBound)
    );
    assert_eq!(
        parse_rule("FREQ=DAILY;UNTIL=01/05/2024"),
        Err(RuleParseError::MalformedDate {
            field: "UNTIL".to_string(),
            value: "01/05/2024".to_string()
        })
    );
}

#[test]
fn test_occurrences_strictly_increasing_across_corpus() {
    for text in rules::CORPUS {
        let occurrences = rule(text).occurrences(None, None, None).unwrap();
        assert!(!occurrences.is_empty(), "{} produced nothing", text);
        assert!(
            occurrences.windows(2).all(|pair| pair[0].start < pair[1].start),
            "{} is not strictly increasing",
            text
        );
    }
}

#[test]
fn test_materialization_idempotent() {
    let fortnightly = rule(rules::FORTNIGHTLY);
    let horizon = utc(2024, 6, 30, 0, 0);

    let first = materialize(&fortnightly, horizon, StorageFormat::DateTime).unwrap();
    let second = materialize(&fortnightly, horizon, StorageFormat::DateTime).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first[0],
        MaterializationRecord {
            start: "2024-01-01T09:00:00".to_string(),
            end: "2024-01-01T09:00:00".to_string(),
        }
    );
}

#[test]
fn test_settings_drive_materialization() {
    let dir = tempfile::tempdir().unwrap();
    let service = SettingsService::new(dir.path().join("settings.toml"));

    let settings = Settings {
        precreate: "P1M".to_string(),
        storage_format: StorageFormat::Date,
        ..Settings::default()
    };
    service.update(&settings).unwrap();

    let policy = MaterializationPolicy::from_settings(&service.get().unwrap()).unwrap();
    let item = DateRecurItem::new(jan_1_2024_9am(), "UTC").with_rrule(rules::WEEKLY_FOREVER);
    let records = policy.materialize_item(&item, jan_1_2024_9am()).unwrap();

    let starts: Vec<_> = records.iter().map(|r| r.start.as_str()).collect();
    assert_eq!(
        starts,
        vec!["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22", "2024-01-29"]
    );
}
