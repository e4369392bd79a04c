// Test fixtures - reusable test data
// Provides consistent anchors and rules across all test files

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

/// Sample anchor instants
pub mod dates {
    use super::*;

    /// Jan 1, 2024 at 09:00 UTC (a Monday)
    pub fn jan_1_2024_9am() -> DateTime<Utc> {
        utc(2024, 1, 1, 9, 0)
    }

    /// Feb 29, 2024 at 12:00 UTC (leap day)
    pub fn leap_day_2024() -> DateTime<Utc> {
        utc(2024, 2, 29, 12, 0)
    }

    /// Dec 31, 2025 at 23:59 UTC
    pub fn new_years_eve_2025() -> DateTime<Utc> {
        utc(2025, 12, 31, 23, 59)
    }

    pub fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }
}

/// Sample rule texts
pub mod rules {
    pub const DAILY_FIVE: &str = "FREQ=DAILY;COUNT=5";
    pub const DAILY_UNTIL: &str = "FREQ=DAILY;UNTIL=20240103T090000Z";
    pub const FIRST_MONDAY: &str = "FREQ=MONTHLY;BYDAY=+1MO";
    pub const FORTNIGHTLY: &str = "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE";
    pub const QUARTERLY: &str = "FREQ=MONTHLY;INTERVAL=3;COUNT=8";
    pub const WEEKLY_FOREVER: &str = "FREQ=WEEKLY";

    /// Valid rules covering every frequency and most rule parts
    pub const CORPUS: &[&str] = &[
        "FREQ=DAILY;COUNT=5",
        "FREQ=DAILY;INTERVAL=3;BYMONTH=1,2;COUNT=20",
        "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;COUNT=10",
        "FREQ=WEEKLY;BYDAY=TU,SU;WKST=SU;COUNT=10",
        "FREQ=MONTHLY;BYDAY=+1MO;COUNT=12",
        "FREQ=MONTHLY;BYDAY=-1FR;COUNT=12",
        "FREQ=MONTHLY;BYMONTHDAY=-1,15;COUNT=12",
        "FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=5",
        "FREQ=YEARLY;BYMONTH=11;BYDAY=+4TH;COUNT=5",
        "FREQ=YEARLY;BYMONTH=1,7;COUNT=6",
        "FREQ=HOURLY;INTERVAL=6;COUNT=12",
        "FREQ=HOURLY;BYHOUR=9,17;COUNT=10",
        "FREQ=MINUTELY;INTERVAL=15;BYHOUR=9;COUNT=10",
        "FREQ=DAILY;BYHOUR=9,18;BYMINUTE=0,30;COUNT=12",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_fixture_dates_are_valid() {
        assert_eq!(dates::jan_1_2024_9am().weekday(), Weekday::Mon);
        assert_eq!(dates::leap_day_2024().day(), 29);
        assert_eq!(dates::new_years_eve_2025().year(), 2025);
    }
}
