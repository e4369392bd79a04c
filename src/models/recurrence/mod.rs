// Recurrence module
// Structured form of an RFC 5545 recurrence definition

mod timestamp;

pub use timestamp::Timestamp;

use chrono::Weekday;
use std::collections::BTreeSet;

/// Recurrence frequency (the `FREQ` rule part).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Frequency::Yearly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
        Frequency::Hourly,
        Frequency::Minutely,
        Frequency::Secondly,
    ];

    /// Wire code used in rule text, e.g. `WEEKLY`.
    pub fn code(self) -> &'static str {
        match self {
            Frequency::Yearly => "YEARLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Daily => "DAILY",
            Frequency::Hourly => "HOURLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Secondly => "SECONDLY",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|freq| freq.code().eq_ignore_ascii_case(code))
    }

    /// Position in the `ALL` table, used to index per-frequency vocabularies.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Frequencies finer than a day step through wall-clock time.
    pub fn is_intraday(self) -> bool {
        matches!(
            self,
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly
        )
    }
}

/// Ordinal positions allowed in front of a `BYDAY` weekday.
pub const ALLOWED_POSITIONS: [i8; 6] = [1, 2, 3, 4, 5, -1];

/// A `BYDAY` entry: a weekday, optionally restricted to its Nth (or last)
/// appearance within the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub weekday: Weekday,
    pub position: Option<i8>,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            weekday,
            position: None,
        }
    }

    pub fn nth(position: i8, weekday: Weekday) -> Self {
        Self {
            weekday,
            position: Some(position),
        }
    }
}

/// Terminal condition of a rule. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bound {
    #[default]
    Unbounded,
    Count(u32),
    Until(Timestamp),
}

/// A single parsed RRULE or EXRULE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub frequency: Frequency,
    pub interval: u32,
    pub by_day: Vec<WeekdayNum>,
    pub by_month: BTreeSet<u32>,
    pub by_month_day: BTreeSet<i32>,
    pub by_hour: BTreeSet<u32>,
    pub by_minute: BTreeSet<u32>,
    pub by_second: BTreeSet<u32>,
    pub week_start: Weekday,
    pub bound: Bound,
}

impl RuleSpec {
    /// A rule firing every `interval = 1` units of `frequency`, forever.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            by_month: BTreeSet::new(),
            by_month_day: BTreeSet::new(),
            by_hour: BTreeSet::new(),
            by_minute: BTreeSet::new(),
            by_second: BTreeSet::new(),
            week_start: Weekday::Mon,
            bound: Bound::Unbounded,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self.bound, Bound::Unbounded)
    }

    pub fn count(&self) -> Option<u32> {
        match self.bound {
            Bound::Count(count) => Some(count),
            _ => None,
        }
    }

    pub fn until(&self) -> Option<Timestamp> {
        match self.bound {
            Bound::Until(until) => Some(until),
            _ => None,
        }
    }

    /// True when the rule restricts or expands by calendar day at all.
    pub fn has_day_filters(&self) -> bool {
        !self.by_month.is_empty() || !self.by_month_day.is_empty() || !self.by_day.is_empty()
    }
}

/// Everything a rule text carries: the inclusion rule, an optional exclusion
/// rule, and the explicit dates on either side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleDefinition {
    pub rrule: Option<RuleSpec>,
    pub exrule: Option<RuleSpec>,
    pub rdates: Vec<Timestamp>,
    pub exdates: Vec<Timestamp>,
}

impl RuleDefinition {
    /// A definition with nothing that could produce an occurrence.
    pub fn is_empty(&self) -> bool {
        self.rrule.is_none() && self.rdates.is_empty()
    }
}
