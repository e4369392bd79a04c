use chrono::{Utc, Weekday};
use chrono_tz::Tz;
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;

use super::error::RuleParseError;
use crate::models::recurrence::{
    Bound, Frequency, RuleDefinition, RuleSpec, Timestamp, WeekdayNum, ALLOWED_POSITIONS,
};
use crate::utils::date::resolve_local;

/// Parse a complete rule text: an RRULE line (the `RRULE:` prefix is optional
/// on the first line) followed by any number of `RDATE:`, `EXRULE:` and
/// `EXDATE:` lines.
pub fn parse_definition(text: &str) -> Result<RuleDefinition, RuleParseError> {
    let mut definition = RuleDefinition::default();
    let mut first_line = true;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match split_property(line) {
            Some((name, params, value)) => match name.as_str() {
                "RRULE" | "EXRULE" if !params.is_empty() => {
                    return Err(RuleParseError::Syntax(format!(
                        "{} does not take parameters",
                        name
                    )));
                }
                "RRULE" => {
                    if definition.rrule.is_some() {
                        return Err(RuleParseError::Syntax(
                            "more than one RRULE line".to_string(),
                        ));
                    }
                    definition.rrule = Some(parse_rule_body(value)?);
                }
                "EXRULE" => {
                    if definition.exrule.is_some() {
                        return Err(RuleParseError::Syntax(
                            "more than one EXRULE line".to_string(),
                        ));
                    }
                    definition.exrule = Some(parse_rule_body(value)?);
                }
                "RDATE" => {
                    let zone = date_zone("RDATE", &params)?;
                    push_dates(&mut definition.rdates, "RDATE", value, zone)?
                }
                "EXDATE" => {
                    let zone = date_zone("EXDATE", &params)?;
                    push_dates(&mut definition.exdates, "EXDATE", value, zone)?
                }
                _ => return Err(RuleParseError::UnknownKey(name)),
            },
            None if first_line => definition.rrule = Some(parse_rule_body(line)?),
            None => {
                return Err(RuleParseError::Syntax(format!(
                    "expected a property line, found '{}'",
                    line
                )))
            }
        }

        first_line = false;
    }

    Ok(definition)
}

/// Parse a single rule body such as `FREQ=WEEKLY;BYDAY=MO,WE`, with or
/// without a leading `RRULE:`.
pub fn parse_rule(text: &str) -> Result<RuleSpec, RuleParseError> {
    let text = text.trim();
    match split_property(text) {
        Some((name, params, value)) if name == "RRULE" || name == "EXRULE" => {
            if !params.is_empty() {
                return Err(RuleParseError::Syntax(format!("{} does not take parameters", name)));
            }
            parse_rule_body(value)
        }
        Some((name, _, _)) => Err(RuleParseError::UnknownKey(name)),
        None => parse_rule_body(text),
    }
}

/// Split `NAME[;PARAM=..]:VALUE`. Lines whose prefix contains `=` are rule
/// bodies, not properties.
fn split_property(line: &str) -> Option<(String, Vec<&str>, &str)> {
    let (head, value) = line.split_once(':')?;
    if head.contains('=') && !head.contains(';') {
        return None;
    }

    let mut params = head.split(';');
    let name = params.next()?.trim().to_ascii_uppercase();
    if name.contains('=') {
        return None;
    }

    Some((name, params.collect(), value.trim()))
}

/// The zone named by a `TZID` parameter on an RDATE or EXDATE line. `VALUE`
/// is accepted as a hint; any other parameter is rejected.
fn date_zone(field: &str, params: &[&str]) -> Result<Option<Tz>, RuleParseError> {
    let mut zone = None;

    for param in params {
        let (key, value) = param.split_once('=').ok_or_else(|| {
            RuleParseError::Syntax(format!("malformed parameter '{}' on {}", param, field))
        })?;
        let value = value.trim().trim_matches('"');

        match key.trim().to_ascii_uppercase().as_str() {
            "TZID" => {
                let tz = value
                    .parse::<Tz>()
                    .map_err(|_| RuleParseError::invalid("TZID", value))?;
                zone = Some(tz);
            }
            "VALUE" => {
                if !value.eq_ignore_ascii_case("DATE") && !value.eq_ignore_ascii_case("DATE-TIME") {
                    return Err(RuleParseError::invalid("VALUE", value));
                }
            }
            _ => {
                return Err(RuleParseError::Syntax(format!(
                    "unsupported parameter '{}' on {}",
                    param, field
                )))
            }
        }
    }

    Ok(zone)
}

fn push_dates(
    target: &mut Vec<Timestamp>,
    field: &str,
    value: &str,
    zone: Option<Tz>,
) -> Result<(), RuleParseError> {
    for raw in value.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let mut timestamp =
            Timestamp::parse(raw).ok_or_else(|| RuleParseError::malformed_date(field, raw))?;
        // Wall-clock values in a named zone are pinned to their instant
        if let (Some(tz), Timestamp::Local(naive)) = (zone, timestamp) {
            let instant = resolve_local(&tz, naive)
                .ok_or_else(|| RuleParseError::malformed_date(field, raw))?;
            timestamp = Timestamp::from_utc(instant.with_timezone(&Utc));
        }
        if !target.contains(&timestamp) {
            target.push(timestamp);
        }
    }
    Ok(())
}

pub(super) fn parse_rule_body(body: &str) -> Result<RuleSpec, RuleParseError> {
    let mut seen = HashSet::new();
    let mut frequency = None;
    let mut interval = 1u32;
    let mut count = None;
    let mut until = None;
    let mut rule = RuleSpec::new(Frequency::Daily);

    for part in body.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, value) = part.split_once('=').ok_or_else(|| {
            RuleParseError::Syntax(format!("expected KEY=VALUE, found '{}'", part))
        })?;
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        if !seen.insert(key.clone()) {
            return Err(RuleParseError::Syntax(format!("duplicate rule part {}", key)));
        }

        match key.as_str() {
            "FREQ" => {
                frequency = Some(
                    Frequency::from_code(value)
                        .ok_or_else(|| RuleParseError::invalid(&key, value))?,
                );
            }
            "INTERVAL" => interval = parse_positive(&key, value)?,
            "COUNT" => count = Some(parse_positive(&key, value)?),
            "UNTIL" => {
                until = Some(
                    Timestamp::parse(value)
                        .ok_or_else(|| RuleParseError::malformed_date("UNTIL", value))?,
                );
            }
            "BYDAY" => rule.by_day = parse_by_day(value)?,
            "BYMONTH" => rule.by_month = parse_number_set(&key, value, 1..=12)?,
            "BYMONTHDAY" => rule.by_month_day = parse_month_days(value)?,
            "BYHOUR" => rule.by_hour = parse_number_set(&key, value, 0..=23)?,
            "BYMINUTE" => rule.by_minute = parse_number_set(&key, value, 0..=59)?,
            "BYSECOND" => rule.by_second = parse_number_set(&key, value, 0..=59)?,
            "WKST" => {
                rule.week_start = weekday_from_code(&value.to_ascii_uppercase())
                    .ok_or_else(|| RuleParseError::invalid(&key, value))?;
            }
            _ => return Err(RuleParseError::UnknownKey(key)),
        }
    }

    rule.bound = match (count, until) {
        (Some(_), Some(_)) => return Err(RuleParseError::ConflictingBound),
        (Some(count), None) => Bound::Count(count),
        (None, Some(until)) => Bound::Until(until),
        (None, None) => Bound::Unbounded,
    };
    rule.frequency = frequency.ok_or(RuleParseError::MissingFrequency)?;
    rule.interval = interval;

    validate_for_frequency(&rule)?;
    Ok(rule)
}

fn validate_for_frequency(rule: &RuleSpec) -> Result<(), RuleParseError> {
    let positional = matches!(rule.frequency, Frequency::Monthly | Frequency::Yearly);
    if !positional {
        if let Some(day) = rule.by_day.iter().find(|day| day.position.is_some()) {
            return Err(RuleParseError::invalid(
                "BYDAY",
                &super::format::weekday_num_to_string(day),
            ));
        }
    }

    if rule.frequency == Frequency::Weekly && !rule.by_month_day.is_empty() {
        return Err(RuleParseError::Syntax(
            "BYMONTHDAY cannot be used with FREQ=WEEKLY".to_string(),
        ));
    }

    Ok(())
}

fn parse_positive(key: &str, value: &str) -> Result<u32, RuleParseError> {
    match value.parse::<u32>() {
        Ok(number) if number >= 1 => Ok(number),
        _ => Err(RuleParseError::invalid(key, value)),
    }
}

fn parse_number_set(
    key: &str,
    value: &str,
    range: RangeInclusive<u32>,
) -> Result<BTreeSet<u32>, RuleParseError> {
    let mut numbers = BTreeSet::new();
    for raw in value.split(',') {
        let raw = raw.trim();
        let number = raw
            .parse::<u32>()
            .ok()
            .filter(|n| range.contains(n))
            .ok_or_else(|| RuleParseError::invalid(key, raw))?;
        numbers.insert(number);
    }
    Ok(numbers)
}

fn parse_month_days(value: &str) -> Result<BTreeSet<i32>, RuleParseError> {
    let mut days = BTreeSet::new();
    for raw in value.split(',') {
        let raw = raw.trim();
        let day = raw
            .parse::<i32>()
            .ok()
            .filter(|d| *d != 0 && (-31..=31).contains(d))
            .ok_or_else(|| RuleParseError::invalid("BYMONTHDAY", raw))?;
        days.insert(day);
    }
    Ok(days)
}

pub(super) fn parse_by_day(value: &str) -> Result<Vec<WeekdayNum>, RuleParseError> {
    let mut days = Vec::new();
    for raw in value.split(',') {
        let token = raw.trim().to_ascii_uppercase();
        let day = parse_weekday_num(&token)
            .ok_or_else(|| RuleParseError::invalid("BYDAY", raw.trim()))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

fn parse_weekday_num(token: &str) -> Option<WeekdayNum> {
    if !token.is_ascii() || token.len() < 2 || token.len() > 4 {
        return None;
    }

    let (position, code) = token.split_at(token.len() - 2);
    let weekday = weekday_from_code(code)?;
    if position.is_empty() {
        return Some(WeekdayNum::every(weekday));
    }

    let digits = position.trim_start_matches(|c| c == '+' || c == '-');
    if digits.len() != 1 || position.len() - digits.len() > 1 {
        return None;
    }

    let position = position.parse::<i8>().ok()?;
    ALLOWED_POSITIONS
        .contains(&position)
        .then(|| WeekdayNum::nth(position, weekday))
}

pub(super) fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "SU" => Some(Weekday::Sun),
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        _ => None,
    }
}
