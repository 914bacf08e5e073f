//! Records service settings

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Settings of the records service
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsSettings {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Seconds between sweeps of chat histories of closed sessions
    pub chat_prune_interval_secs: u64,
}

impl RecordsSettings {
    /// Load settings from `config/records.*` and `RECORDS__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/records")
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("chat_prune_interval_secs", 300)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("RECORDS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
