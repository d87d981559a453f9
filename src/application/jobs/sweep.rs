//! Shared vocabulary of the batch jobs.
//!
//! A sweep walks a list of candidates one record at a time. Failures are
//! recorded per record and never abort the sweep; a deadline is checked
//! before each record so a sweep stops cleanly between records.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{LifecycleEvent, SubscriptionError, SubscriptionStatus};

/// Whether a sweep persists its decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Save transitions and send notices.
    #[default]
    Apply,
    /// Same selection and decisions, nothing saved or sent.
    DryRun,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Apply
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

/// Per-run options of a sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    pub mode: RunMode,

    /// No record is started at or after this instant.
    pub deadline: Option<Instant>,
}

impl SweepOptions {
    pub fn apply() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self::default().with_mode(RunMode::DryRun)
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `budget` from now.
    pub fn with_time_budget(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline
            .map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// A record the sweep could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub id: SubscriptionId,
    #[serde(serialize_with = "serialize_error")]
    pub error: SubscriptionError,
}

impl RecordFailure {
    pub fn new(id: SubscriptionId, error: impl Into<SubscriptionError>) -> Self {
        Self {
            id,
            error: error.into(),
        }
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &SubscriptionError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A status change a sweep made, or would make in dry-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTransition {
    pub id: SubscriptionId,
    pub event: LifecycleEvent,
    pub from: SubscriptionStatus,
    pub to: SubscriptionStatus,
}
