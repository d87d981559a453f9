//! Subscription lifecycle errors.
//!
//! # Caller handling
//!
//! | Error | Retried? | Surfaced as |
//! |-------|----------|-------------|
//! | InvalidTransition | no | business rule violation (4xx) |
//! | NotFound | no | 404 |
//! | ConcurrentModification | yes, after reload | 409 if retries run out |
//! | Persistence | yes, with backoff (batch jobs) | 5xx for interactive calls |
//! | Dispatch | next scheduled run | logged |
//! | Validation | no | 400 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, ValidationError};

use super::{LifecycleEvent, SubscriptionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The event is not allowed from the current status, or its guard failed.
    #[error("cannot apply {event} to a subscription in {from} state")]
    InvalidTransition {
        from: SubscriptionStatus,
        event: LifecycleEvent,
    },

    #[error("subscription not found: {0}")]
    NotFound(SubscriptionId),

    /// Someone else saved the record since it was loaded.
    #[error("subscription was modified concurrently: {0}")]
    ConcurrentModification(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("notification dispatch failed: {0}")]
    Dispatch(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl SubscriptionError {
    pub fn invalid_transition(from: SubscriptionStatus, event: LifecycleEvent) -> Self {
        SubscriptionError::InvalidTransition { from, event }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        SubscriptionError::Persistence(message.into())
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        SubscriptionError::Dispatch(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            SubscriptionError::NotFound(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            SubscriptionError::Persistence(_) => ErrorCode::DatabaseError,
            SubscriptionError::Dispatch(_) => ErrorCode::DispatchFailed,
            SubscriptionError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }

    /// Returns true if the same operation may succeed when tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::ConcurrentModification(_)
                | SubscriptionError::Persistence(_)
                | SubscriptionError::Dispatch(_)
        )
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ConcurrentModification => {
                SubscriptionError::ConcurrentModification(err.message)
            }
            ErrorCode::DispatchFailed => SubscriptionError::Dispatch(err.message),
            ErrorCode::ValidationFailed => SubscriptionError::Validation(err.message),
            _ => SubscriptionError::Persistence(err.to_string()),
        }
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::Validation(err.to_string())
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_state_and_event() {
        let err = SubscriptionError::invalid_transition(
            SubscriptionStatus::Expired,
            LifecycleEvent::Cancel,
        );
        assert_eq!(
            err.to_string(),
            "cannot apply cancel to a subscription in expired state"
        );
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert!(!err.is_retryable());
    }

    #[test]
    fn infrastructure_errors_are_retryable() {
        assert!(SubscriptionError::persistence("pool timeout").is_retryable());
        assert!(SubscriptionError::ConcurrentModification("v3".into()).is_retryable());
        assert!(SubscriptionError::dispatch("smtp 451").is_retryable());
        assert!(!SubscriptionError::NotFound(SubscriptionId::new()).is_retryable());
    }

    #[test]
    fn domain_error_maps_by_code() {
        let conflict = DomainError::new(ErrorCode::ConcurrentModification, "version 4 expected");
        assert!(matches!(
            SubscriptionError::from(conflict),
            SubscriptionError::ConcurrentModification(ref m) if m == "version 4 expected"
        ));

        let db = DomainError::new(ErrorCode::DatabaseError, "connection reset");
        assert!(matches!(
            SubscriptionError::from(db),
            SubscriptionError::Persistence(ref m) if m.contains("connection reset")
        ));
    }

    #[test]
    fn converts_back_into_domain_error() {
        let id = SubscriptionId::new();
        let err: DomainError = SubscriptionError::NotFound(id).into();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
        assert!(err.message.contains(&id.to_string()));
    }
}
