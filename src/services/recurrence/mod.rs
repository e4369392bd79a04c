// Recurrence service
// Parses rule text and evaluates it into concrete occurrences

mod error;
mod format;
mod generator;
mod parser;
mod set;
mod summary;

pub use error::{RecurrenceError, RuleParseError};
pub use format::{definition_to_string, rule_to_string};
pub use generator::{OccurrenceIter, MAX_EMPTY_PERIODS};
pub use parser::{parse_definition, parse_rule};
pub use set::{combine, evaluate, Combined, Difference, Union, MAX_CONSECUTIVE_EXCLUSIONS};
pub use summary::{describe_definition, describe_rule, Vocabulary, ENGLISH};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::models::occurrence::Occurrence;
use crate::models::recurrence::RuleDefinition;

/// Upper bound on occurrences returned by a query that passes no `limit`.
pub const DEFAULT_MAX_OCCURRENCES: usize = 10_000;

/// A parsed rule bound to its anchor event and timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    definition: RuleDefinition,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: Tz,
    max_occurrences: usize,
}

impl RecurrenceRule {
    /// Parse `rule_text` for an event spanning `start..end` in `timezone`.
    ///
    /// A missing `end` means a zero-length event.
    pub fn new(
        rule_text: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        timezone: &str,
    ) -> Result<Self, RecurrenceError> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| RecurrenceError::UnknownTimezone(timezone.to_string()))?;
        let end = end.unwrap_or(start);
        if end < start {
            return Err(RecurrenceError::EndBeforeStart);
        }

        let definition = parse_definition(rule_text)?;

        Ok(Self {
            definition,
            start,
            end,
            timezone,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        })
    }

    pub fn with_max_occurrences(mut self, max_occurrences: usize) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    pub fn anchor_start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn anchor_end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// True when the inclusion rule has neither `COUNT` nor `UNTIL`.
    pub fn is_infinite(&self) -> bool {
        self.definition
            .rrule
            .as_ref()
            .map(|rule| rule.is_unbounded())
            .unwrap_or(false)
    }

    /// Occurrences whose start lies in `[window_start, window_end]`, in
    /// ascending order.
    ///
    /// Infinite rules need a `window_end` or a `limit`. A query with neither
    /// may return at most `max_occurrences` entries; one that would return
    /// more fails with [`RecurrenceError::SafetyCapExceeded`] instead of being
    /// silently truncated. A `window_end` or `limit` already bounds the result
    /// and lifts the cap.
    pub fn occurrences(
        &self,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Occurrence>, RecurrenceError> {
        if self.is_infinite() && window_end.is_none() && limit.is_none() {
            return Err(RecurrenceError::UnboundedEvaluation);
        }

        let duration = self.duration();
        let anchor = self.start.with_timezone(&self.timezone);
        let horizon = window_end.map(|end| end.with_timezone(&self.timezone));
        let starts = evaluate(&self.definition, anchor, horizon)
            .map(|instant| instant.with_timezone(&Utc))
            .skip_while(|start| matches!(window_start, Some(from) if *start < from))
            .take_while(|start| !matches!(window_end, Some(to) if *start > to))
            .map(|start| Occurrence::new(start, duration));

        let occurrences: Vec<Occurrence> = match (limit, window_end) {
            (Some(limit), _) => starts.take(limit).collect(),
            (None, Some(_)) => starts.collect(),
            (None, None) => {
                let collected: Vec<Occurrence> = starts.take(self.max_occurrences + 1).collect();
                if collected.len() > self.max_occurrences {
                    log::warn!(
                        "Rule '{}' exceeds the cap of {} occurrences",
                        self.rrule_text(),
                        self.max_occurrences
                    );
                    return Err(RecurrenceError::SafetyCapExceeded(self.max_occurrences));
                }
                collected
            }
        };

        log::debug!(
            "Evaluated {} occurrences of '{}' in {}",
            occurrences.len(),
            self.rrule_text(),
            self.timezone
        );
        Ok(occurrences)
    }

    pub fn human_readable(&self) -> String {
        self.human_readable_with(&ENGLISH)
    }

    pub fn human_readable_with(&self, vocabulary: &Vocabulary) -> String {
        describe_definition(&self.definition, vocabulary)
    }

    /// Canonical rule text: the RRULE line, then RDATE, EXRULE and EXDATE.
    pub fn rrule_text(&self) -> String {
        definition_to_string(&self.definition)
    }
}
