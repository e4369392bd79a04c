// Settings module
// Process-wide defaults for evaluation and materialization, stored as TOML

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::occurrence::StorageFormat;

/// How far ahead of "now" recurring entries are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecreateWindow {
    /// Calendar months (years count as twelve)
    pub months: u32,
    /// Remaining fixed-length part (weeks, days, time)
    pub duration: Duration,
}

impl PrecreateWindow {
    /// Parse an ISO 8601 duration such as `P2Y`, `P6M`, `P4W` or `P1Y2M10DT2H`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let parsed = iso8601::duration(value.trim())
            .map_err(|e| format!("Invalid precreate duration '{}': {}", value, e))?;

        let window = match parsed {
            iso8601::Duration::Weeks(weeks) => PrecreateWindow {
                months: 0,
                duration: Duration::weeks(i64::from(weeks)),
            },
            iso8601::Duration::YMDHMS {
                year,
                month,
                day,
                hour,
                minute,
                second,
                millisecond,
            } => PrecreateWindow {
                months: year
                    .checked_mul(12)
                    .and_then(|m| m.checked_add(month))
                    .ok_or_else(|| format!("Precreate duration '{}' is too large", value))?,
                duration: Duration::days(i64::from(day))
                    + Duration::hours(i64::from(hour))
                    + Duration::minutes(i64::from(minute))
                    + Duration::seconds(i64::from(second))
                    + Duration::milliseconds(i64::from(millisecond)),
            },
        };

        if window.months == 0 && window.duration <= Duration::zero() {
            return Err("Precreate duration must be longer than zero".to_string());
        }
        Ok(window)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// ISO 8601 duration of the materialization horizon
    pub precreate: String,
    pub storage_format: StorageFormat,
    /// IANA zone used when an item carries none
    pub default_timezone: String,
    /// Cap on occurrences returned by queries without a limit
    pub max_occurrences: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precreate: "P2Y".to_string(),
            storage_format: StorageFormat::DateTime,
            default_timezone: "UTC".to_string(),
            max_occurrences: 10_000,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        PrecreateWindow::parse(&self.precreate)?;

        if self.default_timezone.parse::<Tz>().is_err() {
            return Err(format!("Unknown timezone '{}'", self.default_timezone));
        }

        if self.max_occurrences == 0 {
            return Err("max_occurrences must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn precreate_window(&self) -> Result<PrecreateWindow, String> {
        PrecreateWindow::parse(&self.precreate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.precreate_window(),
            Ok(PrecreateWindow {
                months: 24,
                duration: Duration::zero()
            })
        );
    }

    #[test_case("P6M", 6, 0)]
    #[test_case("P1Y2M10D", 14, 10)]
    #[test_case("P4W", 0, 28)]
    #[test_case("P30D", 0, 30)]
    fn test_precreate_parsing(value: &str, months: u32, days: i64) {
        let window = PrecreateWindow::parse(value).unwrap();
        assert_eq!(window.months, months);
        assert_eq!(window.duration, Duration::days(days));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut settings = Settings::default();
        settings.precreate = "two years".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.default_timezone = "Nowhere/City".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.max_occurrences = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("precreate = \"P6M\"").unwrap();
        assert_eq!(settings.precreate, "P6M");
        assert_eq!(settings.storage_format, StorageFormat::DateTime);
        assert_eq!(settings.max_occurrences, 10_000);
    }
}
