//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, AdminHandler, BillingEvent,
    BillingEventCommand, BillingEventHandler, BillingEventResult, InspectResult,
};
