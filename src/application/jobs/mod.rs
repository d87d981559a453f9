//! Batch jobs run by the scheduler and the admin CLI.
//!
//! - `ExpiryBatchJob` - expire subscriptions whose time ran out
//! - `NotificationBatchJob` - send renewal notices once per cycle
//! - `JobScheduler` - periodic trigger for both jobs
//! - `sweep` - run modes, deadlines and per-record failures

mod expiry_job;
mod notification_job;
mod scheduler;
mod sweep;

pub use expiry_job::{ExpiryBatchJob, ExpiryReport};
pub use notification_job::{
    NotificationBatchJob, NotificationReport, DEFAULT_MAX_CONCURRENT_DISPATCHES,
};
pub use scheduler::{JobScheduler, JobSchedulerConfig};
pub use sweep::{PlannedTransition, RecordFailure, RunMode, SweepOptions};
