//! Renewal notification scheduling.
//!
//! One notice per expiry cycle. A cycle is identified by the `ends_at` value
//! itself: once a notice went out for a given `ends_at`, nothing more is sent
//! until `ends_at` changes (renewal, admin reset).

use crate::domain::foundation::Timestamp;

use super::access::{self, DEFAULT_EXPIRY_THRESHOLD_DAYS};
use super::{SubscriptionState, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalScheduler {
    threshold_days: i64,
}

impl Default for RenewalScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_THRESHOLD_DAYS)
    }
}

impl RenewalScheduler {
    pub fn new(threshold_days: i64) -> Self {
        Self { threshold_days }
    }

    pub fn threshold_days(&self) -> i64 {
        self.threshold_days
    }

    /// Whether a renewal notice is due for `state` at `now`.
    pub fn should_notify(&self, state: &SubscriptionState, now: Timestamp) -> bool {
        if state.status != SubscriptionStatus::Active {
            return false;
        }
        let Some(days) = access::days_until_expiry(state, now) else {
            return false;
        };

        days >= 0
            && access::is_expiring_soon(state, now, self.threshold_days)
            && !state.notified_for_current_cycle()
    }

    /// Record that a notice was delivered for the current cycle.
    pub fn mark_notified(&self, state: &SubscriptionState, now: Timestamp) -> SubscriptionState {
        let mut next = state.clone();
        next.renewal_notified_at = Some(now);
        next.renewal_notified_for = state.ends_at;
        next.renewal_notification_count = state.renewal_notification_count.saturating_add(1);
        next.updated_at = now;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriptionId, UserId};
    use crate::domain::subscription::{BillingInterval, TransitionEngine};

    fn now() -> Timestamp {
        Timestamp::parse_rfc3339("2026-07-20T10:00:00Z").unwrap()
    }

    fn ending_in(days: i64) -> SubscriptionState {
        let mut state = SubscriptionState::activate(
            SubscriptionId::new(),
            UserId::new("tenant-1").unwrap(),
            BillingInterval::Monthly,
            now().minus_days(25),
        );
        state.ends_at = Some(now().add_days(days));
        state
    }

    #[test]
    fn notifies_inside_window_when_never_notified() {
        let state = ending_in(2);
        assert!(RenewalScheduler::default().should_notify(&state, now()));
    }

    #[test]
    fn mark_notified_records_time_cycle_and_count() {
        let scheduler = RenewalScheduler::default();
        let state = ending_in(2);

        let notified = scheduler.mark_notified(&state, now());

        assert_eq!(notified.renewal_notified_at, Some(now()));
        assert_eq!(notified.renewal_notified_for, state.ends_at);
        assert_eq!(notified.renewal_notification_count, 1);
    }

    #[test]
    fn fires_once_per_cycle_and_rearms_after_renewal() {
        let scheduler = RenewalScheduler::default();
        let state = ending_in(3);
        assert!(scheduler.should_notify(&state, now()));

        let notified = scheduler.mark_notified(&state, now());
        assert!(!scheduler.should_notify(&notified, now()));
        assert!(!scheduler.should_notify(&notified, now().add_days(1)));

        let renewed = TransitionEngine::default()
            .payment_succeeded(&notified, now())
            .unwrap()
            .state;
        assert_eq!(renewed.renewal_notification_count, 0);

        let near_new_end = renewed.ends_at.unwrap().minus_days(2);
        assert!(scheduler.should_notify(&renewed, near_new_end));
    }

    #[test]
    fn outside_window_does_not_notify() {
        assert!(!RenewalScheduler::default().should_notify(&ending_in(8), now()));
        assert!(RenewalScheduler::new(10).should_notify(&ending_in(8), now()));
    }

    #[test]
    fn lapsed_or_open_ended_does_not_notify() {
        let scheduler = RenewalScheduler::default();
        let mut open = ending_in(2);
        open.ends_at = None;

        assert!(!scheduler.should_notify(&ending_in(-1), now()));
        assert!(!scheduler.should_notify(&open, now()));
    }

    #[test]
    fn only_active_subscriptions_are_notified() {
        let scheduler = RenewalScheduler::default();
        for status in [
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Expired,
        ] {
            let mut state = ending_in(2);
            state.status = status;
            assert!(!scheduler.should_notify(&state, now()), "{:?}", status);
        }
    }

    #[test]
    fn non_renewing_subscriptions_are_still_notified() {
        let mut state = ending_in(2);
        state.auto_renew = false;
        assert!(RenewalScheduler::default().should_notify(&state, now()));
    }
}
