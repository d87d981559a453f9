//! In-memory SubscriptionRepository.
//!
//! Backs the CLI when no database is configured and the integration tests.
//! Holds the same version contract as the PostgreSQL adapter.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::subscription::{SubscriptionState, SubscriptionStatus};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

/// Subscriptions keyed by ID. A `BTreeMap` keeps listings in ID order.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    records: RwLock<BTreeMap<SubscriptionId, SubscriptionState>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository that already holds `states`, stored as given.
    pub fn with_subscriptions(states: impl IntoIterator<Item = SubscriptionState>) -> Self {
        let records = states.into_iter().map(|s| (s.id, s)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Every stored subscription, in ID order.
    pub async fn all(&self) -> Vec<SubscriptionState> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<SubscriptionState>, DomainError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, state: &SubscriptionState) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&state.id) {
            return Err(DomainError::validation("id", "Subscription already exists"));
        }
        records.insert(state.id, state.clone());
        Ok(())
    }

    async fn update(
        &self,
        state: &SubscriptionState,
        expected_version: i64,
    ) -> Result<SubscriptionState, DomainError> {
        let mut records = self.records.write().await;
        let stored = records.get_mut(&state.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", state.id),
            )
        })?;

        if stored.version != expected_version {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "subscription {} is at version {}, expected {}",
                    state.id, stored.version, expected_version
                ),
            ));
        }

        let mut next = state.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionState>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|s| s.status == status && filter.matches(s))
            .cloned()
            .collect())
    }
}
