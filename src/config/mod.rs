/// Database connection and schema creation
pub mod database;

/// Application settings loading from config.toml
pub mod settings;

pub use settings::{AppConfig, load_config, load_default_config};
