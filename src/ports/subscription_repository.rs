//! Subscription repository port.
//!
//! Defines the contract for persisting subscription state. Writes are guarded
//! by optimistic concurrency: `update` only succeeds when the stored version
//! still equals the version the caller loaded.
//!
//! # Example
//!
//! ```ignore
//! async fn cancel(
//!     repo: &dyn SubscriptionRepository,
//!     engine: &TransitionEngine,
//!     id: &SubscriptionId,
//!     now: Timestamp,
//! ) -> Result<SubscriptionState, SubscriptionError> {
//!     let current = repo
//!         .find_by_id(id)
//!         .await?
//!         .ok_or_else(|| SubscriptionError::NotFound(*id))?;
//!     let transition = engine.cancel(&current, now)?;
//!     Ok(repo.update(&transition.state, current.version).await?)
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::{SubscriptionState, SubscriptionStatus};

/// Extra narrowing applied on top of a status lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    /// Every record with the status.
    Any,
    /// Grace period unset or not after `now`.
    GraceElapsed { now: Timestamp },
    /// `ends_at` is set.
    EndsAtSet,
    /// `ends_at` is set and not after `now`.
    EndsAtBefore { now: Timestamp },
}

impl SubscriptionFilter {
    /// In-process evaluation of the filter.
    ///
    /// SQL adapters translate the same rules into a WHERE clause.
    pub fn matches(&self, state: &SubscriptionState) -> bool {
        match self {
            SubscriptionFilter::Any => true,
            SubscriptionFilter::GraceElapsed { now } => state
                .grace_period_ends_at
                .map_or(true, |grace| !grace.is_after(now)),
            SubscriptionFilter::EndsAtSet => state.ends_at.is_some(),
            SubscriptionFilter::EndsAtBefore { now } => {
                state.ends_at.is_some_and(|end| !end.is_after(now))
            }
        }
    }
}

/// Repository port for subscription state.
///
/// Implementations must ensure:
/// - `version` is bumped by exactly one on every successful `update`
/// - a version mismatch is reported as `ConcurrentModification`
/// - records are never deleted
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<SubscriptionState>, DomainError>;

    /// Store a new subscription.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a subscription with the same ID exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, state: &SubscriptionState) -> Result<(), DomainError>;

    /// Replace a stored subscription if its version is still `expected_version`.
    ///
    /// Returns the stored state with its new version.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the subscription doesn't exist
    /// - `ConcurrentModification` if the stored version differs
    /// - `DatabaseError` on persistence failure
    async fn update(
        &self,
        state: &SubscriptionState,
        expected_version: i64,
    ) -> Result<SubscriptionState, DomainError>;

    /// Find subscriptions in `status` that also satisfy `filter`.
    ///
    /// Results are ordered by ID so sweeps are deterministic.
    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionState>, DomainError>;
}
