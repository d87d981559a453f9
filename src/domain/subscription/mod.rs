//! Subscription lifecycle domain.
//!
//! # Module Structure
//!
//! - `aggregate` - SubscriptionState entity
//! - `status` - SubscriptionStatus state machine
//! - `interval` - BillingInterval period lengths
//! - `access` - pure access/expiry predicates
//! - `transitions` - table-driven TransitionEngine
//! - `renewal` - RenewalScheduler (one notice per expiry cycle)
//! - `scenario` - named shapes for the admin simulate command
//! - `errors` - SubscriptionError taxonomy

pub mod access;
mod aggregate;
mod errors;
mod interval;
mod renewal;
mod scenario;
mod status;
mod transitions;

pub use access::{AccessSnapshot, DEFAULT_EXPIRY_THRESHOLD_DAYS};
pub use aggregate::SubscriptionState;
pub use errors::SubscriptionError;
pub use interval::BillingInterval;
pub use renewal::RenewalScheduler;
pub use scenario::Scenario;
pub use status::SubscriptionStatus;
pub use transitions::{
    target_status, LifecycleEvent, Transition, TransitionEngine, DEFAULT_GRACE_DAYS,
};
