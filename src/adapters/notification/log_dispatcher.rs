//! Notification dispatcher that writes notices to the log.
//!
//! Used when no delivery channel is wired up (local runs, dry environments).

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{NotificationDispatcher, RenewalNotice};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationDispatcher;

impl LogNotificationDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn send(&self, notice: &RenewalNotice) -> Result<(), DomainError> {
        tracing::info!(
            user_id = %notice.user_id,
            subscription_id = %notice.subscription_id,
            days_until_expiry = notice.days_until_expiry,
            auto_renew = notice.auto_renew,
            "Renewal notice"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriptionId, UserId};

    #[tokio::test]
    async fn always_succeeds() {
        let notice = RenewalNotice {
            user_id: UserId::new("tenant-1").unwrap(),
            subscription_id: SubscriptionId::new(),
            days_until_expiry: 1,
            auto_renew: true,
        };
        assert!(LogNotificationDispatcher::new().send(&notice).await.is_ok());
    }
}
