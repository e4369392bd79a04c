// Occurrence module
// Concrete instances produced by evaluating a rule, and their stored form

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One concrete instance of a recurring entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Occurrence {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Precision used when writing occurrences to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// `YYYY-MM-DD`, the local date in the entry's timezone
    Date,
    /// `YYYY-MM-DDTHH:MM:SS` in UTC
    #[default]
    DateTime,
}

impl StorageFormat {
    pub fn render(&self, instant: DateTime<Utc>, tz: &Tz) -> String {
        match self {
            StorageFormat::Date => instant.with_timezone(tz).format("%Y-%m-%d").to_string(),
            StorageFormat::DateTime => instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFormat::Date => write!(f, "date"),
            StorageFormat::DateTime => write!(f, "datetime"),
        }
    }
}

impl FromStr for StorageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(StorageFormat::Date),
            "datetime" => Ok(StorageFormat::DateTime),
            other => Err(format!(
                "Unknown storage format '{}', expected 'date' or 'datetime'",
                other
            )),
        }
    }
}

/// A stored `{start, end}` pair, already rendered in a [`StorageFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterializationRecord {
    pub start: String,
    pub end: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_occurrence_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let occurrence = Occurrence::new(start, Duration::minutes(90));
        assert_eq!(occurrence.end, Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap());
        assert_eq!(occurrence.duration(), Duration::minutes(90));
    }

    #[test]
    fn test_date_format_uses_local_date() {
        let tz: Tz = "Australia/Sydney".parse().unwrap();
        // 2024-01-01 20:00 UTC is already Jan 2 in Sydney
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(StorageFormat::Date.render(instant, &tz), "2024-01-02");
        assert_eq!(
            StorageFormat::DateTime.render(instant, &tz),
            "2024-01-01T20:00:00"
        );
    }

    #[test]
    fn test_storage_format_parsing() {
        assert_eq!("date".parse::<StorageFormat>(), Ok(StorageFormat::Date));
        assert_eq!("DateTime".parse::<StorageFormat>(), Ok(StorageFormat::DateTime));
        assert!("hour".parse::<StorageFormat>().is_err());
        assert_eq!(StorageFormat::default(), StorageFormat::DateTime);
    }

    #[test]
    fn test_storage_format_serde_names() {
        let json = serde_json::to_string(&StorageFormat::Date).unwrap();
        assert_eq!(json, "\"date\"");
        let parsed: StorageFormat = serde_json::from_str("\"datetime\"").unwrap();
        assert_eq!(parsed, StorageFormat::DateTime);
    }
}
