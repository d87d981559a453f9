//! Subscription status state machine.
//!
//! Exactly one status holds at any time. The edges below are the union of
//! every edge the [`TransitionEngine`](super::TransitionEngine) event table
//! can take; the event table is the finer-grained gate.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up (or open-ended). Access until `ends_at`, if any.
    Active,

    /// User asked to cancel. Access continues until `ends_at`.
    Cancelled,

    /// Payment failed. Access continues until the grace period ends.
    PastDue,

    /// No access. Only an admin reset brings it back.
    Expired,
}

impl SubscriptionStatus {
    /// Every status, in declaration order.
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::Expired,
    ];

    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From ACTIVE
            (Active, Active) // Renewal, admin reset
                | (Active, Cancelled)
                | (Active, PastDue)
                | (Active, Expired)
            // From CANCELLED
                | (Cancelled, Active) // Resume, admin reset
                | (Cancelled, Expired)
            // From PAST_DUE
                | (PastDue, Active) // Payment recovered, admin reset
                | (PastDue, Expired)
            // From EXPIRED
                | (Expired, Active) // Admin reset only
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Active, Cancelled, PastDue, Expired],
            Cancelled => vec![Active, Expired],
            PastDue => vec![Active, Expired],
            Expired => vec![Active],
        }
    }
}
