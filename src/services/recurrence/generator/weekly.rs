use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use super::{combine, times_of_day, Period};
use crate::models::recurrence::RuleSpec;
use crate::utils::date::{days_from_week_start, start_of_week};

pub(super) fn expand(rule: &RuleSpec, anchor: NaiveDateTime, index: i64) -> Option<Period> {
    let weeks = index.checked_mul(i64::from(rule.interval))?;
    let week_start = start_of_week(anchor.date(), rule.week_start)?
        .checked_add_signed(Duration::try_weeks(weeks)?)?;

    let mut weekdays: Vec<_> = rule.by_day.iter().map(|day| day.weekday).collect();
    if weekdays.is_empty() {
        weekdays.push(anchor.weekday());
    }

    let mut dates = Vec::with_capacity(weekdays.len());
    for weekday in weekdays {
        let offset = days_from_week_start(weekday, rule.week_start);
        let date = week_start.checked_add_signed(Duration::days(offset))?;
        if rule.by_month.is_empty() || rule.by_month.contains(&date.month()) {
            dates.push(date);
        }
    }

    Some(Period {
        start: week_start.and_time(NaiveTime::MIN),
        candidates: combine(dates, &times_of_day(rule, anchor)),
        next: index + 1,
    })
}
