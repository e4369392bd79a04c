use chrono::Weekday;
use std::collections::BTreeSet;
use std::fmt;

use crate::models::recurrence::{Bound, RuleDefinition, RuleSpec, Timestamp, WeekdayNum};

pub(crate) fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub(crate) fn weekday_num_to_string(day: &WeekdayNum) -> String {
    match day.position {
        Some(position) => format!("{:+}{}", position, weekday_code(day.weekday)),
        None => weekday_code(day.weekday).to_string(),
    }
}

fn join_numbers<T: ToString>(values: &BTreeSet<T>) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn join_timestamps(values: &[Timestamp]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical rule body without the `RRULE:` prefix.
///
/// `INTERVAL` is omitted when it is 1 and `WKST` when it is Monday, so
/// rule text round-trips without gaining parts the author never wrote.
pub fn rule_to_string(rule: &RuleSpec) -> String {
    let mut parts = vec![format!("FREQ={}", rule.frequency.code())];

    if rule.interval != 1 {
        parts.push(format!("INTERVAL={}", rule.interval));
    }
    if !rule.by_day.is_empty() {
        let days: Vec<String> = rule.by_day.iter().map(weekday_num_to_string).collect();
        parts.push(format!("BYDAY={}", days.join(",")));
    }
    if !rule.by_month.is_empty() {
        parts.push(format!("BYMONTH={}", join_numbers(&rule.by_month)));
    }
    if !rule.by_month_day.is_empty() {
        parts.push(format!("BYMONTHDAY={}", join_numbers(&rule.by_month_day)));
    }
    if !rule.by_hour.is_empty() {
        parts.push(format!("BYHOUR={}", join_numbers(&rule.by_hour)));
    }
    if !rule.by_minute.is_empty() {
        parts.push(format!("BYMINUTE={}", join_numbers(&rule.by_minute)));
    }
    if !rule.by_second.is_empty() {
        parts.push(format!("BYSECOND={}", join_numbers(&rule.by_second)));
    }
    if rule.week_start != Weekday::Mon {
        parts.push(format!("WKST={}", weekday_code(rule.week_start)));
    }
    match rule.bound {
        Bound::Unbounded => {}
        Bound::Count(count) => parts.push(format!("COUNT={}", count)),
        Bound::Until(until) => parts.push(format!("UNTIL={}", until)),
    }

    parts.join(";")
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rule_to_string(self))
    }
}

/// Full rule text: the RRULE line, then RDATE, EXRULE and EXDATE lines in
/// that fixed order.
pub fn definition_to_string(definition: &RuleDefinition) -> String {
    let mut lines = Vec::new();

    if let Some(rrule) = &definition.rrule {
        lines.push(format!("RRULE:{}", rule_to_string(rrule)));
    }
    if !definition.rdates.is_empty() {
        lines.push(format!("RDATE:{}", join_timestamps(&definition.rdates)));
    }
    if let Some(exrule) = &definition.exrule {
        lines.push(format!("EXRULE:{}", rule_to_string(exrule)));
    }
    if !definition.exdates.is_empty() {
        lines.push(format!("EXDATE:{}", join_timestamps(&definition.exdates)));
    }

    lines.join("\n")
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&definition_to_string(self))
    }
}
