//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionRepository` - Versioned subscription persistence
//! - `NotificationDispatcher` - Renewal notice delivery
//! - `Clock` - Current time

mod clock;
mod notification_dispatcher;
mod subscription_repository;

pub use clock::Clock;
pub use notification_dispatcher::{NotificationDispatcher, RenewalNotice};
pub use subscription_repository::{SubscriptionFilter, SubscriptionRepository};
