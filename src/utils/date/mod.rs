// Date utility functions
// Calendar arithmetic and timezone resolution for the recurrence engine

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Weekday};
use chrono_tz::Tz;

/// Map a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (clocks going back) take the earlier instant. Times that
/// fall into a gap (clocks going forward) are moved forward by one hour.
pub fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Move a (year, month) pair by `months`, which may be negative.
pub fn advance_month(year: i32, month: u32, months: i64) -> Option<(i32, u32)> {
    let index = i64::from(year)
        .checked_mul(12)?
        .checked_add(i64::from(month) - 1)?
        .checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = (index.rem_euclid(12) + 1) as u32;
    Some((year, month))
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)
}

/// Resolve a possibly negative month day (`-1` = last day) to a date.
pub fn select_month_day(year: i32, month: u32, day: i32) -> Option<NaiveDate> {
    let len = days_in_month(year, month)? as i32;
    let resolved = if day < 0 { len + 1 + day } else { day };
    if resolved < 1 || resolved > len {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, resolved as u32)
}

/// Days from `week_start` forward to `weekday` (0..=6).
pub fn days_from_week_start(weekday: Weekday, week_start: Weekday) -> i64 {
    let offset = weekday.num_days_from_monday() as i64 - week_start.num_days_from_monday() as i64;
    offset.rem_euclid(7)
}

/// First day of the week containing `date`, for weeks beginning on `week_start`.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(days_from_week_start(
        date.weekday(),
        week_start,
    )))
}

/// The `position`-th `weekday` between `first` and `last` inclusive.
/// Positive positions count from the start, `-1` is the last one.
pub fn select_positional_weekday(
    first: NaiveDate,
    last: NaiveDate,
    weekday: Weekday,
    position: i8,
) -> Option<NaiveDate> {
    let candidate = if position > 0 {
        let first_match = first + Duration::days(days_from_week_start(weekday, first.weekday()));
        first_match.checked_add_signed(Duration::weeks(i64::from(position) - 1))?
    } else if position < 0 {
        let last_match = last - Duration::days(days_from_week_start(last.weekday(), weekday));
        last_match.checked_sub_signed(Duration::weeks(-i64::from(position) - 1))?
    } else {
        return None;
    };

    (candidate >= first && candidate <= last).then_some(candidate)
}

/// Every `weekday` between `first` and `last` inclusive.
pub fn weekdays_between(first: NaiveDate, last: NaiveDate, weekday: Weekday) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = first + Duration::days(days_from_week_start(weekday, first.weekday()));
    while current <= last {
        dates.push(current);
        current += Duration::weeks(1);
    }
    dates
}
