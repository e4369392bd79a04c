use chrono::Datelike;

use crate::models::recurrence::{Bound, RuleDefinition, RuleSpec, WeekdayNum, ALLOWED_POSITIONS};

/// Words substituted into a rule summary.
///
/// Tables are indexed the way the rest of the crate indexes them: units by
/// [`Frequency::index`](crate::models::recurrence::Frequency::index), days from
/// Monday, months from January, positions in [`ALLOWED_POSITIONS`] order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub every: &'static str,
    pub units: [&'static str; 7],
    pub plural_units: [&'static str; 7],
    pub day_names: [&'static str; 7],
    pub month_names: [&'static str; 12],
    pub month_abbreviations: [&'static str; 12],
    pub positions: [&'static str; 6],
    pub the: &'static str,
    pub on: &'static str,
    pub in_months: &'static str,
    pub at_hour: &'static str,
    pub at_minute: &'static str,
    pub at_second: &'static str,
    pub until: &'static str,
    pub for_count: &'static str,
    pub time: &'static str,
    pub times: &'static str,
    pub selected_dates: &'static str,
    pub separator: &'static str,
    /// Day-of-month ordinal, e.g. `1st` or `last`.
    pub day_ordinal: fn(i32) -> String,
}

fn english_day_ordinal(day: i32) -> String {
    match day {
        -1 => "last day".to_string(),
        d if d < 0 => format!("{} to last day", english_day_ordinal(-d)),
        d => {
            let suffix = match (d % 10, d % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{}{}", d, suffix)
        }
    }
}

pub const ENGLISH: Vocabulary = Vocabulary {
    every: "every",
    units: ["year", "month", "week", "day", "hour", "minute", "second"],
    plural_units: ["years", "months", "weeks", "days", "hours", "minutes", "seconds"],
    day_names: [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ],
    month_names: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    month_abbreviations: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    positions: ["first", "second", "third", "fourth", "fifth", "last"],
    the: "the",
    on: "on",
    in_months: "in",
    at_hour: "at hour",
    at_minute: "at minute",
    at_second: "at second",
    until: "until",
    for_count: "for",
    time: "time",
    times: "times",
    selected_dates: "on selected dates",
    separator: ", ",
    day_ordinal: english_day_ordinal,
};

impl Default for Vocabulary {
    fn default() -> Self {
        ENGLISH
    }
}

fn describe_day(day: &WeekdayNum, vocab: &Vocabulary) -> String {
    let name = vocab.day_names[day.weekday.num_days_from_monday() as usize];
    let position = day
        .position
        .and_then(|position| ALLOWED_POSITIONS.iter().position(|p| *p == position));

    match position {
        Some(index) => format!("{} {} {}", vocab.the, vocab.positions[index], name),
        None => name.to_string(),
    }
}

fn join_numbers(values: impl Iterator<Item = String>, vocab: &Vocabulary) -> String {
    values.collect::<Vec<_>>().join(vocab.separator)
}

/// Render a single rule, e.g. `every 2 weeks on Monday, Wednesday until Jan 1 2025`.
pub fn describe_rule(rule: &RuleSpec, vocab: &Vocabulary) -> String {
    let unit = rule.frequency.index();
    let mut text = if rule.interval == 1 {
        format!("{} {}", vocab.every, vocab.units[unit])
    } else {
        format!("{} {} {}", vocab.every, rule.interval, vocab.plural_units[unit])
    };

    if !rule.by_month_day.is_empty() {
        // 1st, 15th, last day, 2nd to last day
        let from_start = rule.by_month_day.iter().filter(|day| **day > 0);
        let from_end = rule.by_month_day.iter().rev().filter(|day| **day < 0);
        let days = join_numbers(
            from_start.chain(from_end).map(|day| (vocab.day_ordinal)(*day)),
            vocab,
        );
        text.push_str(&format!(" {} {} {}", vocab.on, vocab.the, days));
    }
    if !rule.by_day.is_empty() {
        let days: Vec<String> = rule.by_day.iter().map(|day| describe_day(day, vocab)).collect();
        text.push_str(&format!(" {} {}", vocab.on, days.join(vocab.separator)));
    }
    if !rule.by_month.is_empty() {
        let months = join_numbers(
            rule.by_month
                .iter()
                .map(|month| vocab.month_names[*month as usize - 1].to_string()),
            vocab,
        );
        text.push_str(&format!(" {} {}", vocab.in_months, months));
    }

    for (label, values) in [
        (vocab.at_hour, &rule.by_hour),
        (vocab.at_minute, &rule.by_minute),
        (vocab.at_second, &rule.by_second),
    ] {
        if !values.is_empty() {
            let values = join_numbers(values.iter().map(ToString::to_string), vocab);
            text.push_str(&format!(" {} {}", label, values));
        }
    }

    match rule.bound {
        Bound::Unbounded => {}
        Bound::Count(count) => {
            let noun = if count == 1 { vocab.time } else { vocab.times };
            text.push_str(&format!(" {} {} {}", vocab.for_count, count, noun));
        }
        Bound::Until(until) => {
            let date = until.date();
            text.push_str(&format!(
                " {} {} {} {}",
                vocab.until,
                vocab.month_abbreviations[date.month0() as usize],
                date.day(),
                date.year()
            ));
        }
    }

    text
}

/// Render a whole definition. Only the inclusion rule is described; a set made
/// of explicit dates alone gets the `selected_dates` phrase.
pub fn describe_definition(definition: &RuleDefinition, vocab: &Vocabulary) -> String {
    match &definition.rrule {
        Some(rule) => describe_rule(rule, vocab),
        None if !definition.rdates.is_empty() => vocab.selected_dates.to_string(),
        None => String::new(),
    }
}
