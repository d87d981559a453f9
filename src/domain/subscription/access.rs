//! Access policy.
//!
//! Pure functions over `(state, now)`. Nothing here mutates a subscription:
//! a stale status is reported through [`is_stale`] and reconciled by the
//! transition engine.
//!
//! "In the future" means strictly after `now` everywhere in this module.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::{SubscriptionState, SubscriptionStatus};

/// Default look-ahead window for "expiring soon".
pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i64 = 7;

fn in_future(at: Option<Timestamp>, now: Timestamp) -> bool {
    at.map_or(false, |t| t.is_after(&now))
}

/// Whether the subscription currently grants premium access.
///
/// - Active: yes, unless `ends_at` is set and no longer in the future
/// - Cancelled: yes while `ends_at` is unset or in the future
/// - PastDue: yes while the grace period is in the future; no grace period
///   means no access
/// - Expired: never
pub fn has_access(state: &SubscriptionState, now: Timestamp) -> bool {
    match state.status {
        SubscriptionStatus::Active | SubscriptionStatus::Cancelled => {
            state.ends_at.is_none() || in_future(state.ends_at, now)
        }
        SubscriptionStatus::PastDue => in_future(state.grace_period_ends_at, now),
        SubscriptionStatus::Expired => false,
    }
}

/// Whole days until `ends_at`, rounded up. `None` when there is no end.
///
/// Negative once `ends_at` is more than a day in the past.
pub fn days_until_expiry(state: &SubscriptionState, now: Timestamp) -> Option<i64> {
    state.ends_at.map(|end| now.ceil_days_until(&end))
}

/// Whether `ends_at` is in the future and at most `threshold_days` away.
pub fn is_expiring_soon(state: &SubscriptionState, now: Timestamp, threshold_days: i64) -> bool {
    if !in_future(state.ends_at, now) {
        return false;
    }
    days_until_expiry(state, now).map_or(false, |days| days <= threshold_days)
}

/// Whether the stored status no longer matches what time says it should be.
///
/// True for Active/Cancelled whose `ends_at` has passed, and for PastDue
/// whose grace period has elapsed (or was never set).
pub fn is_stale(state: &SubscriptionState, now: Timestamp) -> bool {
    match state.status {
        SubscriptionStatus::Active | SubscriptionStatus::Cancelled => {
            state.ends_at.is_some() && !in_future(state.ends_at, now)
        }
        SubscriptionStatus::PastDue => !in_future(state.grace_period_ends_at, now),
        SubscriptionStatus::Expired => false,
    }
}

/// Everything the access policy says about one subscription at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessSnapshot {
    pub status: SubscriptionStatus,
    pub has_access: bool,
    pub days_until_expiry: Option<i64>,
    pub expiring_soon: bool,
    pub stale: bool,
    pub evaluated_at: Timestamp,
}

impl AccessSnapshot {
    pub fn evaluate(state: &SubscriptionState, now: Timestamp, threshold_days: i64) -> Self {
        Self {
            status: state.status,
            has_access: has_access(state, now),
            days_until_expiry: days_until_expiry(state, now),
            expiring_soon: is_expiring_soon(state, now, threshold_days),
            stale: is_stale(state, now),
            evaluated_at: now,
        }
    }
}
