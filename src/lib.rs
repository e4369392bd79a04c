// date-recur library
// RFC 5545 recurrence rules: parsing, evaluation, summaries and materialization

pub mod models;
pub mod services;
pub mod utils;

pub use models::date_recur::DateRecurItem;
pub use models::occurrence::{MaterializationRecord, Occurrence, StorageFormat};
pub use models::recurrence::{Bound, Frequency, RuleDefinition, RuleSpec, Timestamp, WeekdayNum};
pub use models::settings::Settings;
pub use services::materialize::{materialize, materialize_single, MaterializationPolicy};
pub use services::recurrence::{RecurrenceError, RecurrenceRule, RuleParseError};
