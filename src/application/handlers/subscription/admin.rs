//! Operator commands: inspect, reset and simulate.
//!
//! Reset goes through the transition engine like any other event. Simulate
//! rewrites a subscription into a named scenario and is meant for test
//! environments only.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{
    AccessSnapshot, RenewalScheduler, Scenario, SubscriptionError, SubscriptionState,
    TransitionEngine,
};
use crate::ports::{Clock, SubscriptionRepository};

/// What the access policy says about one subscription right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectResult {
    pub subscription: SubscriptionState,
    pub access: AccessSnapshot,
    pub renewal_notice_due: bool,
}

pub struct AdminHandler {
    repository: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
    engine: TransitionEngine,
    scheduler: RenewalScheduler,
}

impl AdminHandler {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
        engine: TransitionEngine,
        scheduler: RenewalScheduler,
    ) -> Self {
        Self {
            repository,
            clock,
            engine,
            scheduler,
        }
    }

    async fn load(&self, id: &SubscriptionId) -> Result<SubscriptionState, SubscriptionError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(SubscriptionError::NotFound(*id))
    }

    pub async fn inspect(&self, id: &SubscriptionId) -> Result<InspectResult, SubscriptionError> {
        let subscription = self.load(id).await?;
        let now = self.clock.now();

        Ok(InspectResult {
            access: AccessSnapshot::evaluate(&subscription, now, self.scheduler.threshold_days()),
            renewal_notice_due: self.scheduler.should_notify(&subscription, now),
            subscription,
        })
    }

    /// Reinitialize to Active with a fresh period, whatever the current state.
    pub async fn reset(&self, id: &SubscriptionId) -> Result<SubscriptionState, SubscriptionError> {
        let current = self.load(id).await?;
        let transition = self.engine.admin_reset(&current, self.clock.now())?;
        let saved = self.repository.update(&transition.state, current.version).await?;

        tracing::info!(subscription_id = %id, from = %transition.from, "Subscription reset");
        Ok(saved)
    }

    /// Force the subscription into `scenario`.
    pub async fn simulate(
        &self,
        id: &SubscriptionId,
        scenario: Scenario,
    ) -> Result<SubscriptionState, SubscriptionError> {
        let current = self.load(id).await?;
        let next = scenario.apply(&current, self.clock.now());
        let saved = self.repository.update(&next, current.version).await?;

        tracing::info!(subscription_id = %id, scenario = %scenario, "Scenario applied");
        Ok(saved)
    }
}
