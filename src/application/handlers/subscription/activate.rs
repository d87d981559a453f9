//! ActivateSubscriptionHandler - creates a subscription after the first payment.

use std::sync::Arc;

use crate::domain::foundation::{SubscriptionId, UserId};
use crate::domain::subscription::{BillingInterval, SubscriptionError, SubscriptionState};
use crate::ports::{Clock, SubscriptionRepository};

/// Command to activate a new subscription.
#[derive(Debug, Clone)]
pub struct ActivateSubscriptionCommand {
    /// Chosen by the caller so billing callbacks can reference it right away.
    pub subscription_id: Option<SubscriptionId>,
    pub user_id: UserId,
    pub billing_interval: BillingInterval,
}

pub struct ActivateSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl ActivateSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn handle(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<SubscriptionState, SubscriptionError> {
        let state = SubscriptionState::activate(
            cmd.subscription_id.unwrap_or_default(),
            cmd.user_id,
            cmd.billing_interval,
            self.clock.now(),
        );

        self.repository.insert(&state).await?;

        tracing::info!(
            subscription_id = %state.id,
            user_id = %state.user_id,
            billing_interval = %state.billing_interval,
            "Subscription activated"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::SubscriptionStatus;

    fn now() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-15T10:00:00Z").unwrap()
    }

    fn handler(repo: Arc<InMemorySubscriptionRepository>) -> ActivateSubscriptionHandler {
        ActivateSubscriptionHandler::new(repo, Arc::new(FixedClock::new(now())))
    }

    #[tokio::test]
    async fn creates_active_subscription_for_one_interval() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());

        let state = handler(repo.clone())
            .handle(ActivateSubscriptionCommand {
                subscription_id: None,
                user_id: UserId::new("tenant-7").unwrap(),
                billing_interval: BillingInterval::Annual,
            })
            .await
            .unwrap();

        assert_eq!(state.status, SubscriptionStatus::Active);
        assert_eq!(state.ends_at, Some(now().add_days(365)));
        assert_eq!(repo.find_by_id(&state.id).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn reusing_an_id_is_rejected() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let id = SubscriptionId::new();
        let cmd = ActivateSubscriptionCommand {
            subscription_id: Some(id),
            user_id: UserId::new("tenant-7").unwrap(),
            billing_interval: BillingInterval::Monthly,
        };

        handler(repo.clone()).handle(cmd.clone()).await.unwrap();
        let err = handler(repo).handle(cmd).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::Validation(_)));
    }
}
