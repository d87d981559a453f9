//! ExpiryBatchJob - moves subscriptions whose time ran out to Expired.
//!
//! Candidates:
//! - PastDue whose grace period is unset or elapsed
//! - Active or Cancelled whose `ends_at` has passed
//!
//! Each candidate gets a `ReconcileExpiry` transition saved with a version
//! check. A second run with the same `now` finds no candidates.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    SubscriptionError, SubscriptionState, SubscriptionStatus, TransitionEngine,
};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

use super::sweep::{PlannedTransition, RecordFailure, SweepOptions};

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpiryReport {
    /// Candidates looked at before the sweep finished or hit its deadline.
    pub examined: usize,
    /// Transitions saved. Always 0 in dry-run.
    pub transitioned: usize,
    pub failures: Vec<RecordFailure>,
    /// The deadline stopped the sweep before every candidate was examined.
    pub interrupted: bool,
    /// Transitions computed, saved or not.
    pub planned: Vec<PlannedTransition>,
}

pub struct ExpiryBatchJob {
    repository: Arc<dyn SubscriptionRepository>,
    engine: TransitionEngine,
}

impl ExpiryBatchJob {
    pub fn new(repository: Arc<dyn SubscriptionRepository>, engine: TransitionEngine) -> Self {
        Self { repository, engine }
    }

    /// Subscriptions that are stale at `now`, in query order.
    pub async fn candidates(
        &self,
        now: Timestamp,
    ) -> Result<Vec<SubscriptionState>, SubscriptionError> {
        let mut candidates = self
            .repository
            .find_by_status(
                SubscriptionStatus::PastDue,
                SubscriptionFilter::GraceElapsed { now },
            )
            .await?;
        for status in [SubscriptionStatus::Active, SubscriptionStatus::Cancelled] {
            candidates.extend(
                self.repository
                    .find_by_status(status, SubscriptionFilter::EndsAtBefore { now })
                    .await?,
            );
        }
        Ok(candidates)
    }

    /// Run one sweep at `now`.
    ///
    /// # Errors
    ///
    /// Only when the candidate query itself fails. Per-record problems end up
    /// in [`ExpiryReport::failures`].
    pub async fn run(
        &self,
        now: Timestamp,
        options: SweepOptions,
    ) -> Result<ExpiryReport, SubscriptionError> {
        let candidates = self.candidates(now).await?;
        let mut report = ExpiryReport::default();

        for state in candidates {
            if options.deadline_passed() {
                report.interrupted = true;
                break;
            }
            report.examined += 1;

            let transition = match self.engine.reconcile_expiry(&state, now) {
                Ok(transition) => transition,
                Err(err) => {
                    tracing::warn!(subscription_id = %state.id, error = %err, "Expiry rejected");
                    report.failures.push(RecordFailure::new(state.id, err));
                    continue;
                }
            };

            let planned = PlannedTransition {
                id: state.id,
                event: transition.event,
                from: transition.from,
                to: transition.to,
            };

            if options.mode.is_dry_run() {
                report.planned.push(planned);
                continue;
            }

            match self.repository.update(&transition.state, state.version).await {
                Ok(_) => {
                    tracing::debug!(
                        subscription_id = %state.id,
                        from = %transition.from,
                        "Subscription expired"
                    );
                    report.transitioned += 1;
                    report.planned.push(planned);
                }
                Err(err) => {
                    let err = SubscriptionError::from(err);
                    tracing::warn!(subscription_id = %state.id, error = %err, "Failed to save expiry");
                    report.failures.push(RecordFailure::new(state.id, err));
                }
            }
        }

        tracing::info!(
            mode = ?options.mode,
            examined = report.examined,
            transitioned = report.transitioned,
            failures = report.failures.len(),
            interrupted = report.interrupted,
            "Expiry sweep finished"
        );

        Ok(report)
    }
}
