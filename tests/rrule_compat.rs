// Differential tests against the rrule crate
// Both engines must agree on every finite rule in the fixture corpus

mod fixtures;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use date_recur::services::recurrence::RecurrenceRule;
use fixtures::rules::CORPUS;
use pretty_assertions::assert_eq;
use rrule::RRuleSet;
use test_case::test_case;

fn reference(dtstart: &str, rule: &str) -> Vec<DateTime<Utc>> {
    let text = format!("{}\nRRULE:{}", dtstart, rule);
    let set: RRuleSet = text.parse().expect("rrule accepts the rule");
    set.all(u16::MAX)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

fn ours(start: DateTime<Utc>, tz: &str, rule: &str) -> Vec<DateTime<Utc>> {
    RecurrenceRule::new(rule, start, None, tz)
        .unwrap()
        .occurrences(None, None, None)
        .unwrap()
        .into_iter()
        .map(|o| o.start)
        .collect()
}

#[test_case("UTC")]
#[test_case("Europe/Berlin")]
#[test_case("America/New_York")]
#[test_case("Australia/Sydney")]
fn test_corpus_matches_reference(tz_name: &str) {
    let tz: Tz = tz_name.parse().unwrap();
    let start = tz
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc);
    let dtstart = format!("DTSTART;TZID={}:20240101T090000", tz_name);

    for rule in CORPUS {
        assert_eq!(ours(start, tz_name, rule), reference(&dtstart, rule), "{}", rule);
    }
}

#[test]
fn test_until_matches_reference() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let rule = "FREQ=WEEKLY;BYDAY=MO,FR;UNTIL=20240201T090000Z";
    assert_eq!(
        ours(start, "UTC", rule),
        reference("DTSTART:20240101T090000Z", rule)
    );
}

#[test]
fn test_dst_transition_matches_reference() {
    // Weekly at 10:00 Berlin across the October switch to winter time
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    let start = tz
        .with_ymd_and_hms(2024, 10, 7, 10, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc);
    let rule = "FREQ=WEEKLY;COUNT=6";

    assert_eq!(
        ours(start, "Europe/Berlin", rule),
        reference("DTSTART;TZID=Europe/Berlin:20241007T100000", rule)
    );
}
