//! Scheduler configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::jobs::{JobSchedulerConfig, DEFAULT_MAX_CONCURRENT_DISPATCHES};

use super::error::ValidationError;

/// Timing of the periodic sweeps
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between expiry sweeps
    #[serde(default = "default_expiry_interval")]
    pub expiry_interval_secs: u64,

    /// Seconds between notification sweeps
    #[serde(default = "default_notification_interval")]
    pub notification_interval_secs: u64,

    /// Time budget of one sweep in seconds
    #[serde(default = "default_sweep_deadline")]
    pub sweep_deadline_secs: u64,

    /// Renewal notices in flight at once
    #[serde(default = "default_max_concurrent_dispatches")]
    pub max_concurrent_dispatches: usize,
}

impl SchedulerConfig {
    pub fn sweep_deadline(&self) -> Duration {
        Duration::from_secs(self.sweep_deadline_secs)
    }

    pub fn job_scheduler_config(&self) -> JobSchedulerConfig {
        JobSchedulerConfig::default()
            .with_expiry_interval(Duration::from_secs(self.expiry_interval_secs))
            .with_notification_interval(Duration::from_secs(self.notification_interval_secs))
            .with_sweep_deadline(self.sweep_deadline())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range(
            "scheduler.expiry_interval_secs",
            self.expiry_interval_secs,
            1,
            86_400,
        )?;
        ValidationError::check_range(
            "scheduler.notification_interval_secs",
            self.notification_interval_secs,
            1,
            7 * 86_400,
        )?;
        ValidationError::check_range(
            "scheduler.sweep_deadline_secs",
            self.sweep_deadline_secs,
            1,
            86_400,
        )?;
        ValidationError::check_range(
            "scheduler.max_concurrent_dispatches",
            self.max_concurrent_dispatches as u64,
            1,
            64,
        )
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            expiry_interval_secs: default_expiry_interval(),
            notification_interval_secs: default_notification_interval(),
            sweep_deadline_secs: default_sweep_deadline(),
            max_concurrent_dispatches: default_max_concurrent_dispatches(),
        }
    }
}

fn default_expiry_interval() -> u64 {
    3600
}

fn default_notification_interval() -> u64 {
    86_400
}

fn default_sweep_deadline() -> u64 {
    300
}

fn default_max_concurrent_dispatches() -> usize {
    DEFAULT_MAX_CONCURRENT_DISPATCHES
}
