//! Authentication service settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `config/auth.{toml,yaml,json}` file, then `AUTH__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Settings of the authentication service
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Lifetime of a login session in seconds
    pub session_ttl_seconds: i64,
    /// Extra entries for the common-password denylist
    #[serde(default)]
    pub common_passwords: Vec<String>,
}

impl AuthSettings {
    /// Load settings from the default file and the environment
    ///
    /// # Environment Variables
    /// - `AUTH__BIND_ADDRESS` (default: `0.0.0.0:3000`)
    /// - `AUTH__SESSION_TTL_SECONDS` (default: 28800)
    /// - `AUTH__COMMON_PASSWORDS`: comma separated
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/auth")
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let settings: AuthSettings = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_seconds", 28_800_i64)?
            .set_default("common_passwords", Vec::<String>::new())?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("AUTH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("common_passwords")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if settings.session_ttl_seconds <= 0 {
            return Err(ConfigError::Message(
                "session_ttl_seconds must be positive".to_string(),
            ));
        }

        Ok(settings)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_seconds)
    }
}
