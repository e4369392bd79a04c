use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::utils::date::resolve_local;

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// A compact RFC 5545 timestamp as it appears in `UNTIL`, `RDATE` and `EXDATE`.
///
/// The variant records which form was written so the text can be reproduced
/// exactly; timezone resolution is deferred until the rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// `YYYYMMDDTHHMMSSZ`
    Utc(NaiveDateTime),
    /// `YYYYMMDDTHHMMSS`, wall-clock time in the rule's timezone
    Local(NaiveDateTime),
    /// `YYYYMMDD`
    Date(NaiveDate),
}

impl Timestamp {
    /// Parse one of the three compact forms. Locale-formatted input is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if !value.is_ascii() {
            return None;
        }

        match value.len() {
            8 => parse_digits_date(value).map(Timestamp::Date),
            15 => parse_digits_date_time(value).map(Timestamp::Local),
            16 => {
                let naive = value
                    .strip_suffix('Z')
                    .or_else(|| value.strip_suffix('z'))
                    .and_then(parse_digits_date_time)?;
                Some(Timestamp::Utc(naive))
            }
            _ => None,
        }
    }

    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Timestamp::Utc(instant.naive_utc())
    }

    /// The calendar date as written, without any timezone shift.
    pub fn date(&self) -> NaiveDate {
        match self {
            Timestamp::Utc(naive) | Timestamp::Local(naive) => naive.date(),
            Timestamp::Date(date) => *date,
        }
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, Timestamp::Date(_))
    }

    /// Resolve to an instant in `tz`. Date-only values take `time_of_day`.
    pub fn resolve(&self, tz: &Tz, time_of_day: NaiveTime) -> Option<DateTime<Tz>> {
        match self {
            Timestamp::Utc(naive) => Some(Utc.from_utc_datetime(naive).with_timezone(tz)),
            Timestamp::Local(naive) => resolve_local(tz, *naive),
            Timestamp::Date(date) => resolve_local(tz, date.and_time(time_of_day)),
        }
    }

    /// Latest instant covered by this value: date-only values cover the whole day.
    pub fn resolve_upper(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            Timestamp::Date(date) => {
                let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
                resolve_local(tz, date.and_time(end_of_day))
            }
            _ => self.resolve(tz, NaiveTime::MIN),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Utc(naive) => write!(f, "{}Z", naive.format(DATE_TIME_FORMAT)),
            Timestamp::Local(naive) => write!(f, "{}", naive.format(DATE_TIME_FORMAT)),
            Timestamp::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

fn parse_digits_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = value[0..4].parse().ok()?;
    let month: u32 = value[4..6].parse().ok()?;
    let day: u32 = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_digits_date_time(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 15 || !value[8..9].eq_ignore_ascii_case("T") {
        return None;
    }

    let date = parse_digits_date(&value[0..8])?;
    let time = &value[9..15];
    if !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: u32 = time[4..6].parse().ok()?;
    Some(date.and_time(NaiveTime::from_hms_opt(hour, minute, second)?))
}
