//! Transition engine.
//!
//! Table-driven: `(status, event)` maps to a target status, optionally
//! behind a time guard. Anything outside the table is an
//! [`SubscriptionError::InvalidTransition`].
//!
//! | From | Event | To | Guard |
//! |------|-------|----|-------|
//! | Active | Cancel | Cancelled | |
//! | Active | PaymentFailed | PastDue | |
//! | Active, PastDue | PaymentSucceeded | Active | |
//! | Active, Cancelled, PastDue | ReconcileExpiry | Expired | state is stale |
//! | Cancelled | Resume | Active | `ends_at` unset or in the future |
//! | any | AdminReset | Active | |
//!
//! The engine works on a copy and hands back the new state only when every
//! check passed, so a rejected event leaves the caller's value untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, Timestamp, ValidationError};

use super::{access, SubscriptionError, SubscriptionState, SubscriptionStatus};

/// Default number of days a past-due subscription keeps access.
pub const DEFAULT_GRACE_DAYS: i64 = 3;

/// Something that can happen to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// User asked to cancel; access continues until `ends_at`.
    Cancel,
    /// A renewal charge failed; the grace period starts.
    PaymentFailed,
    /// A charge succeeded; the paid period is extended by one interval.
    PaymentSucceeded,
    /// Time has run out (`ends_at` passed or grace elapsed).
    ReconcileExpiry,
    /// User withdrew a cancellation before `ends_at`.
    Resume,
    /// Operator reinitialized the subscription.
    AdminReset,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Cancel => "cancel",
            LifecycleEvent::PaymentFailed => "payment_failed",
            LifecycleEvent::PaymentSucceeded => "payment_succeeded",
            LifecycleEvent::ReconcileExpiry => "reconcile_expiry",
            LifecycleEvent::Resume => "resume",
            LifecycleEvent::AdminReset => "admin_reset",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cancel" => Ok(LifecycleEvent::Cancel),
            "payment_failed" => Ok(LifecycleEvent::PaymentFailed),
            "payment_succeeded" => Ok(LifecycleEvent::PaymentSucceeded),
            "reconcile_expiry" => Ok(LifecycleEvent::ReconcileExpiry),
            "resume" => Ok(LifecycleEvent::Resume),
            "admin_reset" => Ok(LifecycleEvent::AdminReset),
            other => Err(ValidationError::invalid_format(
                "event",
                format!("unknown lifecycle event '{}'", other),
            )),
        }
    }
}

/// Looks up the target status for `event` in the transition table.
///
/// Guards that depend on time are checked separately.
pub fn target_status(from: SubscriptionStatus, event: LifecycleEvent) -> Option<SubscriptionStatus> {
    use LifecycleEvent::*;
    use SubscriptionStatus::*;

    match (from, event) {
        (Active, Cancel) => Some(Cancelled),
        (Active, PaymentFailed) => Some(PastDue),
        (Active | PastDue, PaymentSucceeded) => Some(Active),
        (Active | Cancelled | PastDue, ReconcileExpiry) => Some(Expired),
        (Cancelled, Resume) => Some(Active),
        (_, AdminReset) => Some(Active),
        _ => None,
    }
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub event: LifecycleEvent,
    pub from: SubscriptionStatus,
    pub to: SubscriptionStatus,
    pub state: SubscriptionState,
}

/// Validates and applies lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEngine {
    grace_days: i64,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_DAYS)
    }
}

impl TransitionEngine {
    pub fn new(grace_days: i64) -> Self {
        Self { grace_days }
    }

    pub fn grace_days(&self) -> i64 {
        self.grace_days
    }

    /// Apply `event` to `state` at `now`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the event is not in the table for the
    /// current status or its guard fails.
    pub fn apply(
        &self,
        state: &SubscriptionState,
        event: LifecycleEvent,
        now: Timestamp,
    ) -> Result<Transition, SubscriptionError> {
        let from = state.status;
        let rejected = || SubscriptionError::invalid_transition(from, event);

        let to = target_status(from, event).ok_or_else(rejected)?;
        from.transition_to(to).map_err(|_| rejected())?;

        match event {
            LifecycleEvent::ReconcileExpiry if !access::is_stale(state, now) => {
                return Err(rejected());
            }
            LifecycleEvent::Resume
                if state.ends_at.is_some_and(|end| !end.is_after(&now)) =>
            {
                return Err(rejected());
            }
            _ => {}
        }

        let mut next = state.clone();
        next.status = to;
        next.updated_at = now;

        match event {
            LifecycleEvent::Cancel => {
                next.cancelled_at = Some(now);
                next.auto_renew = false;
            }
            LifecycleEvent::PaymentFailed => {
                next.grace_period_ends_at = Some(now.add_days(self.grace_days));
            }
            LifecycleEvent::PaymentSucceeded => {
                next.grace_period_ends_at = None;
                next.extend_one_interval(now);
            }
            LifecycleEvent::ReconcileExpiry => {
                next.grace_period_ends_at = None;
            }
            LifecycleEvent::Resume => {
                next.cancelled_at = None;
                next.auto_renew = true;
            }
            LifecycleEvent::AdminReset => {
                next.starts_at = now;
                next.set_ends_at(Some(next.billing_interval.advance(now)));
                next.cancelled_at = None;
                next.grace_period_ends_at = None;
                next.renewal_notified_at = None;
                next.renewal_notified_for = None;
                next.renewal_notification_count = 0;
                next.auto_renew = true;
            }
        }

        Ok(Transition {
            event,
            from,
            to,
            state: next,
        })
    }

    pub fn cancel(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::Cancel, now)
    }

    pub fn payment_failed(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::PaymentFailed, now)
    }

    pub fn payment_succeeded(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::PaymentSucceeded, now)
    }

    pub fn reconcile_expiry(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::ReconcileExpiry, now)
    }

    pub fn resume(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::Resume, now)
    }

    pub fn admin_reset(&self, state: &SubscriptionState, now: Timestamp) -> Result<Transition, SubscriptionError> {
        self.apply(state, LifecycleEvent::AdminReset, now)
    }
}
