use chrono::{Duration, NaiveDateTime, NaiveTime};

use super::{combine, day_matches, times_of_day, Period};
use crate::models::recurrence::RuleSpec;

pub(super) fn expand(rule: &RuleSpec, anchor: NaiveDateTime, index: i64) -> Option<Period> {
    let days = index.checked_mul(i64::from(rule.interval))?;
    let date = anchor
        .date()
        .checked_add_signed(Duration::try_days(days)?)?;

    let dates = if day_matches(rule, date) {
        vec![date]
    } else {
        Vec::new()
    };

    Some(Period {
        start: date.and_time(NaiveTime::MIN),
        candidates: combine(dates, &times_of_day(rule, anchor)),
        next: index + 1,
    })
}
