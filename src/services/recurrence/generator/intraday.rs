use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use super::{day_matches, values_or, Period};
use crate::models::recurrence::{Frequency, RuleSpec};

fn unit_seconds(frequency: Frequency) -> i64 {
    match frequency {
        Frequency::Hourly => 3_600,
        Frequency::Minutely => 60,
        _ => 1,
    }
}

/// Expand the `index`-th hour, minute or second after the anchor.
///
/// Stepping is on wall-clock time. When a coarser filter rejects the current
/// slot the next period jumps past the rejected day, hour or minute instead
/// of walking it one step at a time.
pub(super) fn expand(rule: &RuleSpec, anchor: NaiveDateTime, index: i64) -> Option<Period> {
    let step = unit_seconds(rule.frequency).checked_mul(i64::from(rule.interval))?;
    let current = anchor.checked_add_signed(Duration::try_seconds(index.checked_mul(step)?)?)?;
    let hour_start = current.date().and_hms_opt(current.hour(), 0, 0)?;

    let skip_to = |boundary: NaiveDateTime| -> Option<Period> {
        let gap = boundary.signed_duration_since(current).num_seconds();
        let periods = ((gap + step - 1) / step).max(1);
        Some(Period {
            start: current,
            candidates: Vec::new(),
            next: index.checked_add(periods)?,
        })
    };

    if !day_matches(rule, current.date()) {
        let midnight = current.date().succ_opt()?.and_time(NaiveTime::MIN);
        return skip_to(midnight);
    }
    if !rule.by_hour.is_empty() && !rule.by_hour.contains(&current.hour()) {
        return skip_to(hour_start.checked_add_signed(Duration::hours(1))?);
    }

    let candidates = match rule.frequency {
        Frequency::Hourly => {
            let minutes = values_or(&rule.by_minute, current.minute());
            let seconds = values_or(&rule.by_second, current.second());
            let mut slots = Vec::with_capacity(minutes.len() * seconds.len());
            for &minute in &minutes {
                for &second in &seconds {
                    slots.push(hour_start.with_minute(minute)?.with_second(second)?);
                }
            }
            slots
        }
        Frequency::Minutely => {
            if !rule.by_minute.is_empty() && !rule.by_minute.contains(&current.minute()) {
                let minute_start = current.with_second(0)?;
                return skip_to(minute_start.checked_add_signed(Duration::minutes(1))?);
            }
            let mut slots = Vec::new();
            for second in values_or(&rule.by_second, current.second()) {
                slots.push(current.with_second(second)?);
            }
            slots
        }
        _ => {
            if !rule.by_minute.is_empty() && !rule.by_minute.contains(&current.minute()) {
                let minute_start = current.with_second(0)?;
                return skip_to(minute_start.checked_add_signed(Duration::minutes(1))?);
            }
            if !rule.by_second.is_empty() && !rule.by_second.contains(&current.second()) {
                return skip_to(current.checked_add_signed(Duration::seconds(1))?);
            }
            vec![current]
        }
    };

    Some(Period {
        start: current,
        candidates,
        next: index.checked_add(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{local, run};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_six_hours() {
        let start = local(&Tz::UTC, 2024, 1, 1, 22, 15);
        let dates = run("FREQ=HOURLY;INTERVAL=6;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-01 22:15:00", "2024-01-02 04:15:00", "2024-01-02 10:15:00"]
        );
    }

    #[test]
    fn test_hourly_limited_to_office_hours() {
        let start = local(&Tz::UTC, 2024, 1, 1, 16, 0);
        let dates = run("FREQ=HOURLY;BYHOUR=9,17;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-01 17:00:00", "2024-01-02 09:00:00", "2024-01-02 17:00:00"]
        );
    }

    #[test]
    fn test_hourly_expands_minutes() {
        let start = local(&Tz::UTC, 2024, 1, 1, 9, 0);
        let dates = run("FREQ=HOURLY;BYMINUTE=15,45;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-01 09:15:00", "2024-01-01 09:45:00", "2024-01-01 10:15:00"]
        );
    }

    #[test]
    fn test_minutely_skips_rejected_days() {
        // 2024-01-05 is a Friday
        let start = local(&Tz::UTC, 2024, 1, 5, 23, 58);
        let dates = run("FREQ=MINUTELY;INTERVAL=30;BYDAY=FR;COUNT=3", start, 10);
        assert_eq!(
            dates,
            vec!["2024-01-05 23:58:00", "2024-01-12 00:28:00", "2024-01-12 00:58:00"]
        );
    }

    #[test]
    fn test_secondly_with_minute_filter() {
        let start = local(&Tz::UTC, 2024, 1, 1, 9, 0);
        let rule = "FREQ=SECONDLY;INTERVAL=20;BYMINUTE=2;COUNT=4";
        let dates = run(rule, start, 10);
        assert_eq!(
            dates,
            vec![
                "2024-01-01 09:02:00",
                "2024-01-01 09:02:20",
                "2024-01-01 09:02:40",
                "2024-01-01 10:02:00"
            ]
        );
    }
}
