//! Application layer - Handlers and batch jobs.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers serve single requests; jobs sweep many subscriptions at once.

pub mod handlers;
pub mod jobs;

pub use handlers::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, AdminHandler, BillingEvent,
    BillingEventCommand, BillingEventHandler, BillingEventResult, InspectResult,
};
pub use jobs::{
    ExpiryBatchJob, ExpiryReport, JobScheduler, JobSchedulerConfig, NotificationBatchJob,
    NotificationReport, RecordFailure, RunMode, SweepOptions,
};
