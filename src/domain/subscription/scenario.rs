//! Named test scenarios for the admin `simulate` command.
//!
//! Each scenario rewrites a subscription into a well-known shape relative to
//! `now`. This bypasses the transition table on purpose and is the only
//! place besides admin reset that may move `ends_at` backward.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

use super::{SubscriptionState, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Active, one full interval left, never notified.
    Active,
    /// Active, ending in three days, never notified.
    ExpiringSoon,
    /// Cancelled, access until five days from now.
    Cancelled,
    /// Cancelled, `ends_at` passed an hour ago.
    CancelledLapsed,
    /// Past due, two days of grace left.
    PastDue,
    /// Past due, grace ended an hour ago.
    GraceElapsed,
    /// Expired a day ago.
    Expired,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::Active,
        Scenario::ExpiringSoon,
        Scenario::Cancelled,
        Scenario::CancelledLapsed,
        Scenario::PastDue,
        Scenario::GraceElapsed,
        Scenario::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Active => "active",
            Scenario::ExpiringSoon => "expiring-soon",
            Scenario::Cancelled => "cancelled",
            Scenario::CancelledLapsed => "cancelled-lapsed",
            Scenario::PastDue => "past-due",
            Scenario::GraceElapsed => "grace-elapsed",
            Scenario::Expired => "expired",
        }
    }

    /// Returns a copy of `state` rewritten into this scenario.
    ///
    /// Identity, owner, interval and version are kept.
    pub fn apply(&self, state: &SubscriptionState, now: Timestamp) -> SubscriptionState {
        let mut next = state.clone();
        next.starts_at = now.minus_days(next.billing_interval.days());
        next.cancelled_at = None;
        next.grace_period_ends_at = None;
        next.renewal_notified_at = None;
        next.renewal_notified_for = None;
        next.renewal_notification_count = 0;
        next.auto_renew = true;
        next.updated_at = now;

        match self {
            Scenario::Active => {
                next.status = SubscriptionStatus::Active;
                next.starts_at = now;
                next.ends_at = Some(next.billing_interval.advance(now));
            }
            Scenario::ExpiringSoon => {
                next.status = SubscriptionStatus::Active;
                next.ends_at = Some(now.add_days(3));
            }
            Scenario::Cancelled => {
                next.status = SubscriptionStatus::Cancelled;
                next.ends_at = Some(now.add_days(5));
                next.cancelled_at = Some(now.minus_days(1));
                next.auto_renew = false;
            }
            Scenario::CancelledLapsed => {
                next.status = SubscriptionStatus::Cancelled;
                next.ends_at = Some(now.minus_hours(1));
                next.cancelled_at = Some(now.minus_days(10));
                next.auto_renew = false;
            }
            Scenario::PastDue => {
                next.status = SubscriptionStatus::PastDue;
                next.ends_at = Some(now.add_days(1));
                next.grace_period_ends_at = Some(now.add_days(2));
            }
            Scenario::GraceElapsed => {
                next.status = SubscriptionStatus::PastDue;
                next.ends_at = Some(now.minus_days(2));
                next.grace_period_ends_at = Some(now.minus_hours(1));
            }
            Scenario::Expired => {
                next.status = SubscriptionStatus::Expired;
                next.ends_at = Some(now.minus_days(1));
            }
        }
        next
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == wanted)
            .ok_or_else(|| {
                ValidationError::invalid_format("scenario", format!("unknown scenario '{}'", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriptionId, UserId};
    use crate::domain::subscription::{access, BillingInterval, RenewalScheduler};

    fn now() -> Timestamp {
        Timestamp::parse_rfc3339("2026-09-01T00:00:00Z").unwrap()
    }

    fn base() -> SubscriptionState {
        let mut state = SubscriptionState::activate(
            SubscriptionId::new(),
            UserId::new("tenant-1").unwrap(),
            BillingInterval::Monthly,
            now().minus_days(100),
        );
        state.version = 7;
        state
    }

    #[test]
    fn scenarios_match_their_access_story() {
        let expectations = [
            (Scenario::Active, true, false),
            (Scenario::ExpiringSoon, true, false),
            (Scenario::Cancelled, true, false),
            (Scenario::CancelledLapsed, false, true),
            (Scenario::PastDue, true, false),
            (Scenario::GraceElapsed, false, true),
            (Scenario::Expired, false, false),
        ];

        for (scenario, has_access, stale) in expectations {
            let state = scenario.apply(&base(), now());
            assert_eq!(access::has_access(&state, now()), has_access, "{}", scenario);
            assert_eq!(access::is_stale(&state, now()), stale, "{}", scenario);
        }
    }

    #[test]
    fn grace_is_only_set_for_past_due_scenarios() {
        for scenario in Scenario::ALL {
            let state = scenario.apply(&base(), now());
            assert_eq!(
                state.grace_period_ends_at.is_some(),
                state.status == SubscriptionStatus::PastDue,
                "{}",
                scenario
            );
        }
    }

    #[test]
    fn expiring_soon_is_due_for_a_notice() {
        let state = Scenario::ExpiringSoon.apply(&base(), now());
        assert!(RenewalScheduler::default().should_notify(&state, now()));
    }

    #[test]
    fn keeps_identity_and_version() {
        let original = base();
        let state = Scenario::Expired.apply(&original, now());
        assert_eq!(state.id, original.id);
        assert_eq!(state.user_id, original.user_id);
        assert_eq!(state.version, 7);
    }

    #[test]
    fn parses_both_spellings() {
        assert_eq!("grace_elapsed".parse(), Ok(Scenario::GraceElapsed));
        assert_eq!("Expiring-Soon".parse(), Ok(Scenario::ExpiringSoon));
        assert!("trial".parse::<Scenario>().is_err());
    }
}
