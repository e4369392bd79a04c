use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::{combine, expand_by_day, month_dates, times_of_day, Period};
use crate::models::recurrence::RuleSpec;

/// Expand the `index`-th yearly period.
///
/// `BYMONTH` expands to those months. `BYDAY` ordinals count within the
/// month when `BYMONTH` is present and within the year otherwise.
pub(super) fn expand(rule: &RuleSpec, anchor: NaiveDateTime, index: i64) -> Option<Period> {
    let offset = index.checked_mul(i64::from(rule.interval))?;
    let year = i32::try_from(i64::from(anchor.year()).checked_add(offset)?).ok()?;
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let dec_last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    let year_scope = (jan_first, dec_last);

    let months: Vec<u32> = if rule.by_month.is_empty() {
        (1..=12).collect()
    } else {
        rule.by_month.iter().copied().collect()
    };

    let dates = if !rule.by_month_day.is_empty() {
        let mut dates = Vec::new();
        for &month in &months {
            let scope = month_scope(rule, year, month, year_scope)?;
            dates.extend(month_dates(rule, year, month, anchor.day(), scope)?);
        }
        dates
    } else if !rule.by_day.is_empty() {
        if rule.by_month.is_empty() {
            expand_by_day(rule, jan_first, dec_last)
        } else {
            let mut dates = Vec::new();
            for &month in &months {
                dates.extend(month_dates(rule, year, month, anchor.day(), year_scope)?);
            }
            dates
        }
    } else if !rule.by_month.is_empty() {
        months
            .iter()
            .filter_map(|&month| NaiveDate::from_ymd_opt(year, month, anchor.day()))
            .collect()
    } else {
        // Feb 29 anchors only fire in leap years
        NaiveDate::from_ymd_opt(year, anchor.month(), anchor.day())
            .into_iter()
            .collect()
    };

    Some(Period {
        start: jan_first.and_time(chrono::NaiveTime::MIN),
        candidates: combine(dates, &times_of_day(rule, anchor)),
        next: index + 1,
    })
}

fn month_scope(
    rule: &RuleSpec,
    year: i32,
    month: u32,
    year_scope: (NaiveDate, NaiveDate),
) -> Option<(NaiveDate, NaiveDate)> {
    if rule.by_month.is_empty() {
        return Some(year_scope);
    }
    Some((
        crate::utils::date::first_of_month(year, month)?,
        crate::utils::date::last_of_month(year, month)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{local, run};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_leap_day_anchor_skips_common_years() {
        let start = local(&Tz::UTC, 2024, 2, 29, 12, 0);
        let dates = run("FREQ=YEARLY;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-02-29 12:00:00", "2028-02-29 12:00:00", "2032-02-29 12:00:00"]
        );
    }

    #[test]
    fn test_by_month_expands_with_anchor_day() {
        let start = local(&Tz::UTC, 2024, 1, 15, 8, 0);
        let dates = run("FREQ=YEARLY;BYMONTH=1,7;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-15 08:00:00", "2024-07-15 08:00:00", "2025-01-15 08:00:00"]
        );
    }

    #[test]
    fn test_positional_day_within_month() {
        // US Thanksgiving
        let start = local(&Tz::UTC, 2024, 1, 1, 0, 0);
        let dates = run("FREQ=YEARLY;BYMONTH=11;BYDAY=+4TH;COUNT=2", start, 10);
        assert_eq!(dates, vec!["2024-11-28 00:00:00", "2025-11-27 00:00:00"]);
    }

    #[test]
    fn test_positional_day_within_year() {
        let start = local(&Tz::UTC, 2024, 1, 1, 0, 0);
        let dates = run("FREQ=YEARLY;BYDAY=-1FR;COUNT=2", start, 10);
        assert_eq!(dates, vec!["2024-12-27 00:00:00", "2025-12-26 00:00:00"]);
    }

    #[test]
    fn test_month_day_without_month_covers_all_months() {
        let start = local(&Tz::UTC, 2024, 1, 1, 0, 0);
        let dates = run("FREQ=YEARLY;BYMONTHDAY=-1;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-31 00:00:00", "2024-02-29 00:00:00", "2024-03-31 00:00:00"]
        );
    }

    #[test]
    fn test_interval_skips_years() {
        let start = local(&Tz::UTC, 2024, 6, 1, 10, 0);
        let dates = run("FREQ=YEARLY;INTERVAL=2;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-06-01 10:00:00", "2026-06-01 10:00:00", "2028-06-01 10:00:00"]
        );
    }
}
