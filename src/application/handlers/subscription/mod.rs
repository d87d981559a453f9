//! Subscription command handlers.
//!
//! - `ActivateSubscriptionHandler` - create a subscription after the first payment
//! - `BillingEventHandler` - payment and user events, with conflict retry
//! - `AdminHandler` - inspect, reset and simulate

mod activate;
mod admin;
mod billing_event;

pub use activate::{ActivateSubscriptionCommand, ActivateSubscriptionHandler};
pub use admin::{AdminHandler, InspectResult};
pub use billing_event::{
    BillingEvent, BillingEventCommand, BillingEventHandler, BillingEventResult,
    DEFAULT_MAX_ATTEMPTS,
};
