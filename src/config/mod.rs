//! Application configuration module
//!
//! Configuration is read from environment variables with the
//! `SUBSCRIPTION_LIFECYCLE` prefix, `__` separating nested keys. A `.env`
//! file is honoured in development.
//!
//! # Example
//!
//! ```no_run
//! use subscription_lifecycle::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Grace period: {} days", config.lifecycle.grace_days);
//! ```

mod database;
mod error;
mod lifecycle;
mod scheduler;
mod storage;
mod telemetry;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use lifecycle::LifecycleConfig;
pub use scheduler::SchedulerConfig;
pub use storage::StorageConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// in-memory setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection. Absent means local storage.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Grace period, renewal window and default interval
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Sweep intervals and budgets
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `SUBSCRIPTION_LIFECYCLE__DATABASE__URL=...` -> `database.url = ...`
    /// - `SUBSCRIPTION_LIFECYCLE__LIFECYCLE__GRACE_DAYS=5` -> `lifecycle.grace_days = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUBSCRIPTION_LIFECYCLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.lifecycle.validate()?;
        self.scheduler.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    pub fn uses_database(&self) -> bool {
        self.database.is_some()
    }
}
