//! Subscription entity.
//!
//! One `SubscriptionState` per tenant subscription. The lifecycle engine only
//! ever produces new values of this type; it never deletes one.
//!
//! # Design Decisions
//!
//! - **Time is an argument**: constructors and transitions take `now`
//! - **Cycle marker**: `renewal_notified_for` stores the `ends_at` value a
//!   renewal notice was sent for, so a renewal re-arms notifications even if
//!   the new end date happens to equal an older one
//! - **Version**: bumped by the repository on every successful update

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::{BillingInterval, SubscriptionStatus};

/// Lifecycle state of one subscription.
///
/// # Invariants
///
/// - `grace_period_ends_at` is `Some` only while `status == PastDue`
/// - `ends_at` is never moved backward by automated transitions
/// - `renewal_notification_count` counts notices for the current `ends_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub id: SubscriptionId,

    /// Tenant account the subscription belongs to.
    pub user_id: UserId,

    pub status: SubscriptionStatus,

    /// Length of one paid period.
    pub billing_interval: BillingInterval,

    /// Set on activation.
    pub starts_at: Timestamp,

    /// Moment access lapses. `None` means no defined end.
    pub ends_at: Option<Timestamp>,

    /// Set exactly when the user cancels.
    pub cancelled_at: Option<Timestamp>,

    /// Set only while past due.
    pub grace_period_ends_at: Option<Timestamp>,

    pub auto_renew: bool,

    /// When the last renewal notice went out.
    pub renewal_notified_at: Option<Timestamp>,

    /// The `ends_at` value the last renewal notice was sent for.
    pub renewal_notified_for: Option<Timestamp>,

    /// Notices sent for the current expiry cycle.
    pub renewal_notification_count: u32,

    /// Optimistic concurrency counter.
    pub version: i64,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionState {
    /// Create an Active subscription after the first successful payment.
    ///
    /// Access runs until one billing interval from `now`.
    pub fn activate(
        id: SubscriptionId,
        user_id: UserId,
        billing_interval: BillingInterval,
        now: Timestamp,
    ) -> Self {
        let mut state = Self::open_ended(id, user_id, billing_interval, now);
        state.ends_at = Some(billing_interval.advance(now));
        state
    }

    /// Create an Active auto-renewing subscription with no defined end.
    pub fn open_ended(
        id: SubscriptionId,
        user_id: UserId,
        billing_interval: BillingInterval,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            status: SubscriptionStatus::Active,
            billing_interval,
            starts_at: now,
            ends_at: None,
            cancelled_at: None,
            grace_period_ends_at: None,
            auto_renew: true,
            renewal_notified_at: None,
            renewal_notified_for: None,
            renewal_notification_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a renewal notice already went out for the current `ends_at`.
    pub fn notified_for_current_cycle(&self) -> bool {
        self.ends_at.is_some() && self.renewal_notified_for == self.ends_at
    }

    /// Move `ends_at` one interval forward from `max(ends_at, now)`.
    ///
    /// Starts a new expiry cycle.
    pub(crate) fn extend_one_interval(&mut self, now: Timestamp) {
        let base = match self.ends_at {
            Some(end) if end.is_after(&now) => end,
            _ => now,
        };
        self.set_ends_at(Some(self.billing_interval.advance(base)));
    }

    /// Replace `ends_at`, resetting the per-cycle notification count when it changes.
    pub(crate) fn set_ends_at(&mut self, ends_at: Option<Timestamp>) {
        if self.ends_at != ends_at {
            self.renewal_notification_count = 0;
        }
        self.ends_at = ends_at;
    }
}
