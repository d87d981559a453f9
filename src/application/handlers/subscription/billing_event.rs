//! BillingEventHandler - applies billing callbacks and user actions.
//!
//! Load, transition, save with the loaded version. A lost version race is
//! retried from a fresh load a bounded number of times; any other error is
//! returned as is.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, ValidationError};
use crate::domain::subscription::{
    LifecycleEvent, SubscriptionError, SubscriptionState, SubscriptionStatus, TransitionEngine,
};
use crate::ports::{Clock, SubscriptionRepository};

/// Default number of attempts when the version check keeps failing.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Event delivered by the billing provider or the account UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEvent {
    PaymentSucceeded,
    PaymentFailed,
    UserCancelled,
    UserResumed,
}

impl BillingEvent {
    pub fn lifecycle_event(&self) -> LifecycleEvent {
        match self {
            BillingEvent::PaymentSucceeded => LifecycleEvent::PaymentSucceeded,
            BillingEvent::PaymentFailed => LifecycleEvent::PaymentFailed,
            BillingEvent::UserCancelled => LifecycleEvent::Cancel,
            BillingEvent::UserResumed => LifecycleEvent::Resume,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingEvent::PaymentSucceeded => "payment-succeeded",
            BillingEvent::PaymentFailed => "payment-failed",
            BillingEvent::UserCancelled => "cancel",
            BillingEvent::UserResumed => "resume",
        }
    }
}

impl fmt::Display for BillingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "payment-succeeded" => Ok(BillingEvent::PaymentSucceeded),
            "payment-failed" => Ok(BillingEvent::PaymentFailed),
            "cancel" | "user-cancelled" => Ok(BillingEvent::UserCancelled),
            "resume" | "user-resumed" => Ok(BillingEvent::UserResumed),
            other => Err(ValidationError::invalid_format(
                "billing_event",
                format!("unknown billing event '{}'", other),
            )),
        }
    }
}

/// Command to apply one billing event.
#[derive(Debug, Clone)]
pub struct BillingEventCommand {
    pub subscription_id: SubscriptionId,
    pub event: BillingEvent,
}

/// Result of a successfully applied billing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingEventResult {
    pub subscription: SubscriptionState,
    pub from: SubscriptionStatus,
    pub to: SubscriptionStatus,
    /// Save attempts it took, 1 when there was no conflict.
    pub attempts: u32,
}

pub struct BillingEventHandler {
    repository: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
    engine: TransitionEngine,
    max_attempts: u32,
}

impl BillingEventHandler {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
        engine: TransitionEngine,
    ) -> Self {
        Self {
            repository,
            clock,
            engine,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Values below 1 mean 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn handle(
        &self,
        cmd: BillingEventCommand,
    ) -> Result<BillingEventResult, SubscriptionError> {
        let event = cmd.event.lifecycle_event();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = self
                .repository
                .find_by_id(&cmd.subscription_id)
                .await?
                .ok_or(SubscriptionError::NotFound(cmd.subscription_id))?;

            let transition = self.engine.apply(&current, event, self.clock.now())?;

            match self.repository.update(&transition.state, current.version).await {
                Ok(saved) => {
                    tracing::debug!(
                        subscription_id = %cmd.subscription_id,
                        event = %event,
                        from = %transition.from,
                        to = %transition.to,
                        "Billing event applied"
                    );
                    return Ok(BillingEventResult {
                        subscription: saved,
                        from: transition.from,
                        to: transition.to,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    let err = SubscriptionError::from(err);
                    let conflict = matches!(err, SubscriptionError::ConcurrentModification(_));
                    if conflict && attempt < self.max_attempts {
                        tracing::debug!(
                            subscription_id = %cmd.subscription_id,
                            attempt,
                            "Version conflict, reloading"
                        );
                        continue;
                    }
                    tracing::warn!(
                        subscription_id = %cmd.subscription_id,
                        event = %event,
                        error = %err,
                        "Billing event not saved"
                    );
                    return Err(err);
                }
            }
        }
    }
}
