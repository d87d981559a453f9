//! Notification dispatcher port.
//!
//! Delivers renewal notices. Delivery is at-least-once: the notification job
//! marks a subscription as notified only after `send` returned `Ok`, so a
//! crash between the two may repeat a notice.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// One renewal notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalNotice {
    pub user_id: UserId,
    pub subscription_id: SubscriptionId,
    pub days_until_expiry: i64,
    /// False when access will simply lapse at the end of the period.
    pub auto_renew: bool,
}

/// Port for sending renewal notices.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Send one notice.
    ///
    /// # Errors
    ///
    /// - `DispatchFailed` when the notice could not be delivered
    async fn send(&self, notice: &RenewalNotice) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn notification_dispatcher_is_object_safe() {
        fn _accepts_dyn(_dispatcher: &dyn NotificationDispatcher) {}
    }

    #[test]
    fn notice_serializes_flat() {
        let notice = RenewalNotice {
            user_id: UserId::new("tenant-9").unwrap(),
            subscription_id: SubscriptionId::new(),
            days_until_expiry: 3,
            auto_renew: false,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["user_id"], "tenant-9");
        assert_eq!(json["days_until_expiry"], 3);
        assert_eq!(json["auto_renew"], false);
    }
}
