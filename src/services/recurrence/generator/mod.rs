// Occurrence generator
// Walks a rule period by period and yields instants in ascending order

mod daily;
mod intraday;
mod monthly;
mod weekly;
mod yearly;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use std::collections::VecDeque;

use crate::models::recurrence::{Frequency, RuleSpec, WeekdayNum};
use crate::utils::date::{resolve_local, select_month_day, select_positional_weekday};

/// Consecutive periods without a single candidate before the walk gives up.
pub const MAX_EMPTY_PERIODS: u32 = 100_000;

/// The candidates of one frequency period, in wall-clock order.
#[derive(Debug)]
pub(super) struct Period {
    pub start: NaiveDateTime,
    pub candidates: Vec<NaiveDateTime>,
    /// Index of the next period worth expanding.
    pub next: i64,
}

/// Lazily generated occurrences of a single rule, anchored at `start`.
///
/// Candidates before the anchor are dropped, `COUNT` is charged per emitted
/// instant and `UNTIL` is inclusive.
#[derive(Debug, Clone)]
pub struct OccurrenceIter<'a> {
    rule: &'a RuleSpec,
    tz: Tz,
    anchor: NaiveDateTime,
    until: Option<DateTime<Tz>>,
    remaining: Option<u32>,
    period: i64,
    buffer: VecDeque<DateTime<Tz>>,
    last: Option<DateTime<Tz>>,
    finished: bool,
}

impl<'a> OccurrenceIter<'a> {
    pub fn new(rule: &'a RuleSpec, start: DateTime<Tz>) -> Self {
        let tz = start.timezone();
        let until = rule.until().and_then(|until| until.resolve_upper(&tz));

        Self {
            rule,
            tz,
            anchor: start.naive_local(),
            until,
            remaining: rule.count(),
            period: 0,
            buffer: VecDeque::new(),
            last: None,
            finished: rule.count() == Some(0),
        }
    }

    /// Stop once candidates pass `horizon`, as if it were an inclusive `UNTIL`.
    pub fn with_horizon(mut self, horizon: Option<DateTime<Tz>>) -> Self {
        if let Some(horizon) = horizon {
            self.until = Some(self.until.map_or(horizon, |until| until.min(horizon)));
        }
        self
    }

    fn expand(&self) -> Option<Period> {
        match self.rule.frequency {
            Frequency::Yearly => yearly::expand(self.rule, self.anchor, self.period),
            Frequency::Monthly => monthly::expand(self.rule, self.anchor, self.period),
            Frequency::Weekly => weekly::expand(self.rule, self.anchor, self.period),
            Frequency::Daily => daily::expand(self.rule, self.anchor, self.period),
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                intraday::expand(self.rule, self.anchor, self.period)
            }
        }
    }

    fn past_until(&self, period_start: NaiveDateTime) -> bool {
        // A day of slack covers offset changes between wall clock and instant.
        self.until
            .and_then(|until| until.naive_local().date().succ_opt())
            .map(|limit| period_start.date() > limit)
            .unwrap_or(false)
    }

    /// Expand periods until something lands in the buffer or the walk ends.
    fn fill(&mut self) {
        let mut empty_periods = 0u32;

        while self.buffer.is_empty() && !self.finished {
            let Some(period) = self.expand() else {
                log::debug!("Recurrence walk left the representable calendar range");
                self.finished = true;
                return;
            };

            if self.past_until(period.start) {
                self.finished = true;
                return;
            }
            self.period = period.next;

            for naive in period.candidates {
                if naive < self.anchor {
                    continue;
                }
                let Some(instant) = resolve_local(&self.tz, naive) else {
                    continue;
                };
                if matches!(self.until, Some(until) if instant > until) {
                    self.finished = true;
                    break;
                }
                if matches!(self.last, Some(last) if instant <= last) {
                    continue;
                }

                self.last = Some(instant);
                self.buffer.push_back(instant);

                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                    if *remaining == 0 {
                        self.finished = true;
                        break;
                    }
                }
            }

            if self.buffer.is_empty() {
                empty_periods += 1;
                if empty_periods >= MAX_EMPTY_PERIODS {
                    log::warn!(
                        "Rule {} produced no occurrence in {} consecutive periods; stopping",
                        self.rule,
                        MAX_EMPTY_PERIODS
                    );
                    self.finished = true;
                }
            }
        }
    }
}

impl Iterator for OccurrenceIter<'_> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            self.fill();
        }
        self.buffer.pop_front()
    }
}

/// Wall-clock times generated for each matching day: the cross product of
/// `BYHOUR`, `BYMINUTE` and `BYSECOND`, each defaulting to the anchor's value.
pub(super) fn times_of_day(rule: &RuleSpec, anchor: NaiveDateTime) -> Vec<NaiveTime> {
    let hours = values_or(&rule.by_hour, anchor.hour());
    let minutes = values_or(&rule.by_minute, anchor.minute());
    let seconds = values_or(&rule.by_second, anchor.second());

    let mut times = Vec::with_capacity(hours.len() * minutes.len() * seconds.len());
    for &hour in &hours {
        for &minute in &minutes {
            for &second in &seconds {
                if let Some(time) = NaiveTime::from_hms_opt(hour, minute, second) {
                    times.push(time);
                }
            }
        }
    }
    times
}

pub(super) fn values_or(values: &std::collections::BTreeSet<u32>, fallback: u32) -> Vec<u32> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.iter().copied().collect()
    }
}

/// Attach every time of day to every date, in ascending order.
pub(super) fn combine(mut dates: Vec<NaiveDate>, times: &[NaiveTime]) -> Vec<NaiveDateTime> {
    dates.sort_unstable();
    dates.dedup();

    dates
        .into_iter()
        .flat_map(|date| times.iter().map(move |time| date.and_time(*time)))
        .collect()
}

/// Day-level filters applied as limits (DAILY and finer).
pub(super) fn day_matches(rule: &RuleSpec, date: NaiveDate) -> bool {
    if !rule.by_month.is_empty() && !rule.by_month.contains(&date.month()) {
        return false;
    }
    if !rule.by_month_day.is_empty() && !month_day_matches(rule, date) {
        return false;
    }
    if !rule.by_day.is_empty() && !rule.by_day.iter().any(|day| day.weekday == date.weekday()) {
        return false;
    }
    true
}

fn month_day_matches(rule: &RuleSpec, date: NaiveDate) -> bool {
    rule.by_month_day
        .iter()
        .any(|&day| select_month_day(date.year(), date.month(), day) == Some(date))
}

/// Whether `date` satisfies a `BYDAY` entry, counting positions between
/// `first` and `last`.
pub(super) fn weekday_num_matches(
    day: &WeekdayNum,
    date: NaiveDate,
    first: NaiveDate,
    last: NaiveDate,
) -> bool {
    if day.weekday != date.weekday() {
        return false;
    }
    match day.position {
        Some(position) => {
            select_positional_weekday(first, last, day.weekday, position) == Some(date)
        }
        None => true,
    }
}

/// Dates in `[first, last]` selected by the rule's `BYDAY` entries.
pub(super) fn expand_by_day(rule: &RuleSpec, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    for day in &rule.by_day {
        match day.position {
            Some(position) => {
                dates.extend(select_positional_weekday(first, last, day.weekday, position));
            }
            None => dates.extend(crate::utils::date::weekdays_between(first, last, day.weekday)),
        }
    }
    dates
}

/// Dates of one month picked by `BYMONTHDAY`, limited by `BYDAY` when both
/// are present. Without either, the anchor's day of month is used.
pub(super) fn month_dates(
    rule: &RuleSpec,
    year: i32,
    month: u32,
    anchor_day: u32,
    scope: (NaiveDate, NaiveDate),
) -> Option<Vec<NaiveDate>> {
    let first = crate::utils::date::first_of_month(year, month)?;
    let last = crate::utils::date::last_of_month(year, month)?;

    let dates = if !rule.by_month_day.is_empty() {
        rule.by_month_day
            .iter()
            .filter_map(|&day| select_month_day(year, month, day))
            .filter(|date| {
                rule.by_day.is_empty()
                    || rule
                        .by_day
                        .iter()
                        .any(|day| weekday_num_matches(day, *date, scope.0, scope.1))
            })
            .collect()
    } else if !rule.by_day.is_empty() {
        expand_by_day(rule, first, last)
    } else {
        NaiveDate::from_ymd_opt(year, month, anchor_day)
            .into_iter()
            .collect()
    };

    Some(dates)
}
