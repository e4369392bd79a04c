// Materialization service
// Turns a rule into the finite list of records written to occurrence storage

use chrono::{DateTime, Months, Utc};
use chrono_tz::Tz;

use crate::models::date_recur::DateRecurItem;
use crate::models::occurrence::{MaterializationRecord, StorageFormat};
use crate::models::settings::{PrecreateWindow, Settings};
use crate::services::recurrence::{RecurrenceError, RecurrenceRule};

/// Records for every occurrence of `rule` from its anchor up to `horizon`.
///
/// The output is a pure function of the rule and the horizon. Records that
/// become identical once rendered (two starts on the same day in
/// [`StorageFormat::Date`]) are kept once.
pub fn materialize(
    rule: &RecurrenceRule,
    horizon: DateTime<Utc>,
    format: StorageFormat,
) -> Result<Vec<MaterializationRecord>, RecurrenceError> {
    let tz = rule.timezone();
    let occurrences = rule.occurrences(Some(rule.anchor_start()), Some(horizon), None)?;

    let mut records: Vec<MaterializationRecord> = occurrences
        .iter()
        .map(|occurrence| MaterializationRecord {
            start: format.render(occurrence.start, &tz),
            end: format.render(occurrence.end, &tz),
        })
        .collect();
    records.dedup();

    log::debug!(
        "Materialized {} records up to {} as {}",
        records.len(),
        horizon,
        format
    );
    Ok(records)
}

/// The single record of a non-recurring entry. A missing end means the entry
/// ends when it starts.
pub fn materialize_single(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    tz: &Tz,
    format: StorageFormat,
) -> MaterializationRecord {
    MaterializationRecord {
        start: format.render(start, tz),
        end: format.render(end.unwrap_or(start), tz),
    }
}

/// Materialization settings resolved once and applied to many items.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationPolicy {
    window: PrecreateWindow,
    format: StorageFormat,
    default_timezone: Tz,
    max_occurrences: usize,
}

impl MaterializationPolicy {
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        settings.validate()?;

        let default_timezone = settings
            .default_timezone
            .parse::<Tz>()
            .map_err(|_| format!("Unknown timezone '{}'", settings.default_timezone))?;

        Ok(Self {
            window: settings.precreate_window()?,
            format: settings.storage_format,
            default_timezone,
            max_occurrences: settings.max_occurrences,
        })
    }

    pub fn with_format(mut self, format: StorageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    /// `now` plus the precreate window, clamped to the latest representable instant.
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_months(Months::new(self.window.months))
            .and_then(|shifted| shifted.checked_add_signed(self.window.duration))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Records for one stored item: its occurrences up to the horizon when it
    /// recurs, otherwise exactly one record.
    pub fn materialize_item(
        &self,
        item: &DateRecurItem,
        now: DateTime<Utc>,
    ) -> Result<Vec<MaterializationRecord>, RecurrenceError> {
        let item = self.with_default_timezone(item);

        match item.recurrence() {
            Some(rule) => {
                let rule = rule.with_max_occurrences(self.max_occurrences);
                materialize(&rule, self.horizon(now), self.format)
            }
            None => {
                let tz = item.timezone.parse::<Tz>().unwrap_or(self.default_timezone);
                Ok(vec![materialize_single(
                    item.start_date,
                    item.end_date,
                    &tz,
                    self.format,
                )])
            }
        }
    }

    fn with_default_timezone(&self, item: &DateRecurItem) -> DateRecurItem {
        let mut item = item.clone();
        if item.timezone.trim().is_empty() {
            item.timezone = self.default_timezone.name().to_string();
        }
        item
    }
}
