use chrono::{Datelike, NaiveDateTime, NaiveTime};

use super::{combine, month_dates, times_of_day, Period};
use crate::models::recurrence::RuleSpec;
use crate::utils::date::{advance_month, first_of_month, last_of_month};

pub(super) fn expand(rule: &RuleSpec, anchor: NaiveDateTime, index: i64) -> Option<Period> {
    let offset = index.checked_mul(i64::from(rule.interval))?;
    let (year, month) = advance_month(anchor.year(), anchor.month(), offset)?;
    let first = first_of_month(year, month)?;
    let last = last_of_month(year, month)?;

    let dates = if rule.by_month.is_empty() || rule.by_month.contains(&month) {
        month_dates(rule, year, month, anchor.day(), (first, last))?
    } else {
        Vec::new()
    };

    Some(Period {
        start: first.and_time(NaiveTime::MIN),
        candidates: combine(dates, &times_of_day(rule, anchor)),
        next: index + 1,
    })
}
