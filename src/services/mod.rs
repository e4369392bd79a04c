// Service module exports

pub mod materialize;
pub mod recurrence;
pub mod settings;
