//! JobScheduler - runs the batch jobs on fixed intervals.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `expiry_interval` | 1h | Time between expiry sweeps |
//! | `notification_interval` | 24h | Time between notification sweeps |
//! | `sweep_deadline` | 5m | Time budget of a single sweep |
//!
//! ## Graceful Shutdown
//!
//! The scheduler listens for a shutdown signal and returns after the sweep in
//! progress, if any, has finished. A sweep cut short by its deadline simply
//! continues on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::ports::Clock;

use super::{ExpiryBatchJob, NotificationBatchJob, SweepOptions};

#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    pub expiry_interval: Duration,
    pub notification_interval: Duration,
    pub sweep_deadline: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            expiry_interval: Duration::from_secs(3600),
            notification_interval: Duration::from_secs(86_400),
            sweep_deadline: Duration::from_secs(300),
        }
    }
}

impl JobSchedulerConfig {
    pub fn with_expiry_interval(mut self, interval: Duration) -> Self {
        self.expiry_interval = interval;
        self
    }

    pub fn with_notification_interval(mut self, interval: Duration) -> Self {
        self.notification_interval = interval;
        self
    }

    pub fn with_sweep_deadline(mut self, deadline: Duration) -> Self {
        self.sweep_deadline = deadline;
        self
    }
}

/// Periodic trigger for the expiry and notification sweeps.
pub struct JobScheduler {
    expiry: ExpiryBatchJob,
    notification: NotificationBatchJob,
    clock: Arc<dyn Clock>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    pub fn new(
        expiry: ExpiryBatchJob,
        notification: NotificationBatchJob,
        clock: Arc<dyn Clock>,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            expiry,
            notification,
            clock,
            config,
        }
    }

    /// Run until the shutdown channel flips to `true` or its sender is dropped.
    ///
    /// Both sweeps fire once immediately, then on their intervals.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut expiry_tick = time::interval(self.config.expiry_interval);
        let mut notification_tick = time::interval(self.config.notification_interval);
        expiry_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        notification_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            expiry_interval_secs = self.config.expiry_interval.as_secs(),
            notification_interval_secs = self.config.notification_interval.as_secs(),
            "Job scheduler started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Job scheduler stopping");
                        return;
                    }
                }

                _ = expiry_tick.tick() => {
                    self.run_expiry_once().await;
                }

                _ = notification_tick.tick() => {
                    self.run_notifications_once().await;
                }
            }
        }
    }

    /// One expiry sweep with the configured deadline.
    pub async fn run_expiry_once(&self) {
        let options = SweepOptions::apply().with_time_budget(self.config.sweep_deadline);
        if let Err(err) = self.expiry.run(self.clock.now(), options).await {
            tracing::warn!(error = %err, "Expiry sweep could not start");
        }
    }

    /// One notification sweep with the configured deadline.
    pub async fn run_notifications_once(&self) {
        let options = SweepOptions::apply().with_time_budget(self.config.sweep_deadline);
        if let Err(err) = self.notification.run(self.clock.now(), options).await {
            tracing::warn!(error = %err, "Notification sweep could not start");
        }
    }
}
