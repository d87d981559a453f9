//! Recording notification dispatcher for testing.
//!
//! Captures every notice it is asked to send and can be told to fail for
//! specific subscriptions, so tests can assert on delivery and retry.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::ports::{NotificationDispatcher, RenewalNotice};

#[derive(Debug, Default)]
pub struct RecordingNotificationDispatcher {
    inner: Mutex<RecordingState>,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<RenewalNotice>,
    failing: HashSet<SubscriptionId>,
    attempts: usize,
}

impl RecordingNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send for `id` fail until [`recover`](Self::recover) is called.
    pub fn fail_for(&self, id: SubscriptionId) {
        self.state().failing.insert(id);
    }

    pub fn recover(&self, id: &SubscriptionId) {
        self.state().failing.remove(id);
    }

    /// Notices that were delivered.
    pub fn sent(&self) -> Vec<RenewalNotice> {
        self.state().sent.clone()
    }

    /// Delivered plus failed sends.
    pub fn attempts(&self) -> usize {
        self.state().attempts
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotificationDispatcher {
    async fn send(&self, notice: &RenewalNotice) -> Result<(), DomainError> {
        let mut state = self.state();
        state.attempts += 1;
        if state.failing.contains(&notice.subscription_id) {
            return Err(DomainError::new(
                ErrorCode::DispatchFailed,
                format!("delivery refused for {}", notice.subscription_id),
            ));
        }
        state.sent.push(notice.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn notice(id: SubscriptionId) -> RenewalNotice {
        RenewalNotice {
            user_id: UserId::new("tenant-1").unwrap(),
            subscription_id: id,
            days_until_expiry: 4,
            auto_renew: true,
        }
    }

    #[tokio::test]
    async fn records_sent_notices() {
        let dispatcher = RecordingNotificationDispatcher::new();
        let id = SubscriptionId::new();

        dispatcher.send(&notice(id)).await.unwrap();

        assert_eq!(dispatcher.sent(), vec![notice(id)]);
        assert_eq!(dispatcher.attempts(), 1);
    }

    #[tokio::test]
    async fn injected_failure_until_recovered() {
        let dispatcher = RecordingNotificationDispatcher::new();
        let id = SubscriptionId::new();
        dispatcher.fail_for(id);

        let err = dispatcher.send(&notice(id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DispatchFailed);
        assert!(dispatcher.sent().is_empty());

        dispatcher.recover(&id);
        dispatcher.send(&notice(id)).await.unwrap();
        assert_eq!(dispatcher.sent().len(), 1);
        assert_eq!(dispatcher.attempts(), 2);
    }
}
