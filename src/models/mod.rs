// Module exports for models

pub mod date_recur;
pub mod occurrence;
pub mod recurrence;
pub mod settings;
