use thiserror::Error;

/// Rule text that could not be turned into a [`RuleDefinition`](crate::models::recurrence::RuleDefinition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("Malformed rule: {0}")]
    Syntax(String),

    #[error("Unknown rule part '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Rule has no FREQ part")]
    MissingFrequency,

    #[error("COUNT and UNTIL cannot be used together")]
    ConflictingBound,

    #[error("Malformed date '{value}' in {field}")]
    MalformedDate { field: String, value: String },
}

impl RuleParseError {
    pub(crate) fn invalid(key: &str, value: &str) -> Self {
        RuleParseError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn malformed_date(field: &str, value: &str) -> Self {
        RuleParseError::MalformedDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Failures surfaced by [`RecurrenceRule`](super::RecurrenceRule).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] RuleParseError),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Event end must not be before its start")]
    EndBeforeStart,

    #[error("Rule is infinite; a window end or a limit is required")]
    UnboundedEvaluation,

    #[error("Rule produces more than {0} occurrences; narrow the window or pass a limit")]
    SafetyCapExceeded(usize),
}
