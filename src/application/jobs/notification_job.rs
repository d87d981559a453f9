//! NotificationBatchJob - sends one renewal notice per expiry cycle.
//!
//! A subscription is marked as notified only after its notice was delivered,
//! so a failed delivery is retried on the next run. Deliveries run with
//! bounded parallelism; each record's save follows its own delivery.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    access, RenewalScheduler, SubscriptionError, SubscriptionState, SubscriptionStatus,
};
use crate::ports::{
    NotificationDispatcher, RenewalNotice, SubscriptionFilter, SubscriptionRepository,
};

use super::sweep::{RecordFailure, SweepOptions};

/// Default number of notices in flight at once.
pub const DEFAULT_MAX_CONCURRENT_DISPATCHES: usize = 4;

/// Outcome of one notification sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    /// Candidates looked at before the sweep finished or hit its deadline.
    pub examined: usize,
    /// Notices delivered and recorded. Always 0 in dry-run.
    pub notified: usize,
    /// Candidates outside the window or already notified this cycle.
    pub skipped: usize,
    pub failures: Vec<RecordFailure>,
    /// The deadline stopped the sweep before every candidate was examined.
    pub interrupted: bool,
    /// Notices that were due, sent or not.
    pub planned: Vec<RenewalNotice>,
}

enum Outcome {
    Notified(RenewalNotice),
    Planned(RenewalNotice),
    Skipped,
    Failed(RecordFailure),
    Interrupted,
}

pub struct NotificationBatchJob {
    repository: Arc<dyn SubscriptionRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    scheduler: RenewalScheduler,
    max_concurrent: usize,
}

impl NotificationBatchJob {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        scheduler: RenewalScheduler,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            scheduler,
            max_concurrent: DEFAULT_MAX_CONCURRENT_DISPATCHES,
        }
    }

    /// Limit the number of notices in flight. Values below 1 mean 1.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Run one sweep at `now`.
    ///
    /// # Errors
    ///
    /// Only when the candidate query itself fails. Per-record problems end up
    /// in [`NotificationReport::failures`].
    pub async fn run(
        &self,
        now: Timestamp,
        options: SweepOptions,
    ) -> Result<NotificationReport, SubscriptionError> {
        let candidates = self
            .repository
            .find_by_status(SubscriptionStatus::Active, SubscriptionFilter::EndsAtSet)
            .await?;

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|state| self.process(state, now, &options))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut report = NotificationReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Interrupted => {
                    report.interrupted = true;
                    continue;
                }
                Outcome::Notified(notice) => {
                    report.notified += 1;
                    report.planned.push(notice);
                }
                Outcome::Planned(notice) => report.planned.push(notice),
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed(failure) => report.failures.push(failure),
            }
            report.examined += 1;
        }
        report.planned.sort_by_key(|notice| notice.subscription_id);
        report.failures.sort_by_key(|failure| failure.id);

        tracing::info!(
            mode = ?options.mode,
            examined = report.examined,
            notified = report.notified,
            skipped = report.skipped,
            failures = report.failures.len(),
            interrupted = report.interrupted,
            "Notification sweep finished"
        );

        Ok(report)
    }

    async fn process(
        &self,
        state: SubscriptionState,
        now: Timestamp,
        options: &SweepOptions,
    ) -> Outcome {
        if options.deadline_passed() {
            return Outcome::Interrupted;
        }
        if !self.scheduler.should_notify(&state, now) {
            return Outcome::Skipped;
        }
        let Some(days_until_expiry) = access::days_until_expiry(&state, now) else {
            return Outcome::Skipped;
        };

        let notice = RenewalNotice {
            user_id: state.user_id.clone(),
            subscription_id: state.id,
            days_until_expiry,
            auto_renew: state.auto_renew,
        };

        if options.mode.is_dry_run() {
            return Outcome::Planned(notice);
        }

        if let Err(err) = self.dispatcher.send(&notice).await {
            tracing::warn!(subscription_id = %state.id, error = %err, "Renewal notice not delivered");
            return Outcome::Failed(RecordFailure::new(
                state.id,
                SubscriptionError::dispatch(err.message),
            ));
        }

        let marked = self.scheduler.mark_notified(&state, now);
        match self.repository.update(&marked, state.version).await {
            Ok(_) => {
                tracing::debug!(
                    subscription_id = %state.id,
                    days_until_expiry,
                    "Renewal notice sent"
                );
                Outcome::Notified(notice)
            }
            Err(err) => {
                let err = SubscriptionError::from(err);
                tracing::warn!(
                    subscription_id = %state.id,
                    error = %err,
                    "Renewal notice sent but not recorded"
                );
                Outcome::Failed(RecordFailure::new(state.id, err))
            }
        }
    }
}
