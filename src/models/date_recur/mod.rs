// Date recur item
// A stored date range with an optional recurrence rule attached

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::recurrence::{RecurrenceError, RecurrenceRule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRecurItem {
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
    pub timezone: String,
}

impl DateRecurItem {
    pub fn new(start_date: DateTime<Utc>, timezone: impl Into<String>) -> Self {
        Self {
            start_date,
            end_date: None,
            rrule: None,
            timezone: timezone.into(),
        }
    }

    pub fn with_end(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }

    /// End of the first instance; a missing end means a zero-length item.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_date.unwrap_or(self.start_date)
    }

    /// Check if this item carries a rule at all
    pub fn is_recurring(&self) -> bool {
        self.rrule
            .as_deref()
            .map(|rule| !rule.trim().is_empty())
            .unwrap_or(false)
    }

    /// Build the recurrence for this item.
    ///
    /// A rule that fails to parse is logged and the item is treated as
    /// non-recurring, so one bad rule never blocks the rest of a save.
    pub fn recurrence(&self) -> Option<RecurrenceRule> {
        if !self.is_recurring() {
            return None;
        }
        let rule = self.rrule.as_deref()?;

        match self.try_recurrence(rule) {
            Ok(recurrence) => Some(recurrence),
            Err(err) => {
                log::warn!(
                    "Ignoring invalid recurrence '{}' starting {}: {}",
                    rule,
                    self.start_date,
                    err
                );
                None
            }
        }
    }

    fn try_recurrence(&self, rule: &str) -> Result<RecurrenceRule, RecurrenceError> {
        RecurrenceRule::new(rule, self.start_date, self.end_date, &self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_item_without_rule_is_single() {
        let item = DateRecurItem::new(start(), "UTC");
        assert!(!item.is_recurring());
        assert!(item.recurrence().is_none());
        assert_eq!(item.effective_end(), start());
    }

    #[test]
    fn test_blank_rule_is_not_recurring() {
        let item = DateRecurItem::new(start(), "UTC").with_rrule("   ");
        assert!(!item.is_recurring());
    }

    #[test]
    fn test_invalid_rule_falls_back_to_single() {
        let item = DateRecurItem::new(start(), "UTC").with_rrule("FREQ=BOGUS");
        assert!(item.is_recurring());
        assert!(item.recurrence().is_none());
    }

    #[test]
    fn test_valid_rule_builds_recurrence() {
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let item = DateRecurItem::new(start(), "Europe/Berlin")
            .with_end(end)
            .with_rrule("FREQ=DAILY;COUNT=2");

        let recurrence = item.recurrence().unwrap();
        assert_eq!(recurrence.anchor_end(), end);
        assert_eq!(recurrence.timezone(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_serde_skips_missing_fields() {
        let item = DateRecurItem::new(start(), "UTC");
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("rrule"));
        let back: DateRecurItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
