// Settings service
// Loads and saves `Settings` as a TOML file

mod service;

pub use service::SettingsService;
