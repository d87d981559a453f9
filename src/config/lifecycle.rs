//! Lifecycle rule configuration

use serde::Deserialize;

use crate::application::handlers::subscription::DEFAULT_MAX_ATTEMPTS;
use crate::domain::subscription::{
    BillingInterval, RenewalScheduler, TransitionEngine, DEFAULT_EXPIRY_THRESHOLD_DAYS,
    DEFAULT_GRACE_DAYS,
};

use super::error::ValidationError;

/// Business rules of the lifecycle engine
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Days a past-due subscription keeps access
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,

    /// Look-ahead window for renewal notices, in days
    #[serde(default = "default_renewal_threshold_days")]
    pub renewal_threshold_days: u32,

    /// Interval for subscriptions created without an explicit one
    #[serde(default)]
    pub default_interval: BillingInterval,

    /// Attempts for a billing event that keeps losing version races
    #[serde(default = "default_max_conflict_attempts")]
    pub max_conflict_attempts: u32,
}

impl LifecycleConfig {
    pub fn transition_engine(&self) -> TransitionEngine {
        TransitionEngine::new(i64::from(self.grace_days))
    }

    pub fn renewal_scheduler(&self) -> RenewalScheduler {
        RenewalScheduler::new(i64::from(self.renewal_threshold_days))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("lifecycle.grace_days", u64::from(self.grace_days), 0, 90)?;
        ValidationError::check_range(
            "lifecycle.renewal_threshold_days",
            u64::from(self.renewal_threshold_days),
            1,
            365,
        )?;
        ValidationError::check_range(
            "lifecycle.max_conflict_attempts",
            u64::from(self.max_conflict_attempts),
            1,
            10,
        )
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_days: default_grace_days(),
            renewal_threshold_days: default_renewal_threshold_days(),
            default_interval: BillingInterval::default(),
            max_conflict_attempts: default_max_conflict_attempts(),
        }
    }
}

fn default_grace_days() -> u32 {
    DEFAULT_GRACE_DAYS as u32
}

fn default_renewal_threshold_days() -> u32 {
    DEFAULT_EXPIRY_THRESHOLD_DAYS as u32
}

fn default_max_conflict_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
