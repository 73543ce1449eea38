//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::schedule::EventZone;

/// Value of `RAILWAY_ENVIRONMENT_NAME` that skips the `.env` file.
pub const PRODUCTION_ENVIRONMENT: &str = "production";

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct Config {
    // === Authorization ===
    /// Shared secret expected verbatim in the `Authorization` header.
    pub authorization: String,

    // === Schedule ===
    /// IANA timezone identifier. The host zone when unset.
    #[serde(default)]
    pub location: Option<String>,

    // === Deployment ===
    /// Deployment environment name; `production` reads the process env only.
    #[serde(default)]
    pub railway_environment_name: Option<String>,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("authorization", &"<redacted>")
            .field("location", &self.location)
            .field("railway_environment_name", &self.railway_environment_name)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Outside production the `.env` file is read first and must exist.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RAILWAY_ENVIRONMENT_NAME").ok();
        if !is_production(environment.as_deref()) {
            dotenvy::dotenv()?;
        }

        Self::from_vars(std::env::vars())
    }

    /// Deserialize configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authorization.is_empty() {
            return Err(ConfigError::MissingAuthorization);
        }

        self.event_zone()?;
        Ok(())
    }

    /// Timezone the schedule is evaluated in.
    pub fn event_zone(&self) -> Result<EventZone, ConfigError> {
        match &self.location {
            Some(name) => EventZone::parse(name),
            None => Ok(EventZone::host()),
        }
    }

    /// Whether this is the production deployment.
    pub fn is_production(&self) -> bool {
        is_production(self.railway_environment_name.as_deref())
    }
}

fn is_production(environment: Option<&str>) -> bool {
    environment == Some(PRODUCTION_ENVIRONMENT)
}
