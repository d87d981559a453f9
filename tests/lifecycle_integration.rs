//! End-to-end lifecycle tests.
//!
//! These drive the handlers and batch jobs together against the in-memory
//! and file repositories, with a fixed clock standing in for the passage of
//! time:
//! 1. Activation, renewal notices and payment-driven renewal
//! 2. Payment failure, grace period and expiry
//! 3. Dispatch failures retried on the next sweep
//! 4. Dry-run sweeps and state file persistence
//! 5. Version conflicts resolved by reload-and-retry

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use subscription_lifecycle::adapters::{
    FileSubscriptionRepository, FixedClock, InMemorySubscriptionRepository,
    RecordingNotificationDispatcher,
};
use subscription_lifecycle::application::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, AdminHandler, BillingEvent,
    BillingEventCommand, BillingEventHandler, ExpiryBatchJob, NotificationBatchJob, SweepOptions,
};
use subscription_lifecycle::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use subscription_lifecycle::domain::subscription::{
    BillingInterval, LifecycleEvent, RenewalScheduler, SubscriptionError, SubscriptionState,
    SubscriptionStatus, TransitionEngine,
};
use subscription_lifecycle::ports::{SubscriptionFilter, SubscriptionRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn start() -> Timestamp {
    Timestamp::parse_rfc3339("2026-01-01T00:00:00Z").unwrap()
}

struct Harness {
    repo: Arc<dyn SubscriptionRepository>,
    clock: Arc<FixedClock>,
    dispatcher: Arc<RecordingNotificationDispatcher>,
}

impl Harness {
    fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            repo,
            clock: Arc::new(FixedClock::new(start())),
            dispatcher: Arc::new(RecordingNotificationDispatcher::new()),
        }
    }

    fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySubscriptionRepository::new()))
    }

    async fn create(&self, user: &str) -> SubscriptionState {
        ActivateSubscriptionHandler::new(self.repo.clone(), self.clock.clone())
            .handle(ActivateSubscriptionCommand {
                subscription_id: None,
                user_id: UserId::new(user).unwrap(),
                billing_interval: BillingInterval::Monthly,
            })
            .await
            .unwrap()
    }

    async fn billing(
        &self,
        id: SubscriptionId,
        event: BillingEvent,
    ) -> Result<SubscriptionState, SubscriptionError> {
        BillingEventHandler::new(self.repo.clone(), self.clock.clone(), TransitionEngine::default())
            .handle(BillingEventCommand {
                subscription_id: id,
                event,
            })
            .await
            .map(|result| result.subscription)
    }

    fn admin(&self) -> AdminHandler {
        AdminHandler::new(
            self.repo.clone(),
            self.clock.clone(),
            TransitionEngine::default(),
            RenewalScheduler::default(),
        )
    }

    fn expiry(&self) -> ExpiryBatchJob {
        ExpiryBatchJob::new(self.repo.clone(), TransitionEngine::default())
    }

    fn notifications(&self) -> NotificationBatchJob {
        NotificationBatchJob::new(
            self.repo.clone(),
            self.dispatcher.clone(),
            RenewalScheduler::default(),
        )
    }

    fn now(&self) -> Timestamp {
        use subscription_lifecycle::ports::Clock;
        self.clock.now()
    }

    async fn load(&self, id: &SubscriptionId) -> SubscriptionState {
        self.repo.find_by_id(id).await.unwrap().unwrap()
    }
}

// =============================================================================
// Renewal cycle
// =============================================================================

#[tokio::test]
async fn notice_goes_out_once_per_cycle_and_rearms_after_renewal() {
    let h = Harness::in_memory();
    let sub = h.create("tenant-1").await;
    assert_eq!(sub.ends_at, Some(start().add_days(30)));

    // Far from the end date nothing is due.
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 0);
    assert_eq!(report.skipped, 1);

    h.clock.advance_days(25);
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(h.dispatcher.sent()[0].days_until_expiry, 5);
    assert!(h.dispatcher.sent()[0].auto_renew);

    // A second sweep in the same cycle sends nothing.
    h.clock.advance_days(1);
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 0);
    assert_eq!(h.dispatcher.sent().len(), 1);

    // Renewal moves ends_at forward and starts a new cycle.
    let renewed = h.billing(sub.id, BillingEvent::PaymentSucceeded).await.unwrap();
    assert_eq!(renewed.ends_at, Some(start().add_days(60)));
    assert_eq!(renewed.renewal_notification_count, 0);
    assert!(!renewed.notified_for_current_cycle());

    h.clock.advance_days(28);
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(h.dispatcher.sent().len(), 2);
    assert_eq!(h.load(&sub.id).await.renewal_notified_for, Some(start().add_days(60)));
}

// =============================================================================
// Payment failure through expiry
// =============================================================================

#[tokio::test]
async fn failed_payment_keeps_access_through_grace_then_expires() {
    let h = Harness::in_memory();
    let sub = h.create("tenant-1").await;

    h.clock.advance_days(10);
    let past_due = h.billing(sub.id, BillingEvent::PaymentFailed).await.unwrap();
    assert_eq!(past_due.status, SubscriptionStatus::PastDue);
    assert_eq!(past_due.grace_period_ends_at, Some(h.now().add_days(3)));

    let inspected = h.admin().inspect(&sub.id).await.unwrap();
    assert!(inspected.access.has_access);
    assert!(!inspected.access.stale);

    // Still inside the grace period: nothing to expire.
    h.clock.advance_days(2);
    let report = h.expiry().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.examined, 0);

    h.clock.advance_days(2);
    assert!(!h.admin().inspect(&sub.id).await.unwrap().access.has_access);

    let report = h.expiry().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.transitioned, 1);
    assert_eq!(report.planned[0].event, LifecycleEvent::ReconcileExpiry);
    assert_eq!(report.planned[0].from, SubscriptionStatus::PastDue);

    let expired = h.load(&sub.id).await;
    assert_eq!(expired.status, SubscriptionStatus::Expired);
    assert_eq!(expired.grace_period_ends_at, None);

    // Idempotent: the expired record is no longer a candidate.
    let report = h.expiry().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(report.transitioned, 0);

    // Payments cannot revive an expired subscription; an operator reset can.
    let err = h.billing(sub.id, BillingEvent::PaymentSucceeded).await.unwrap_err();
    assert_eq!(
        err,
        SubscriptionError::InvalidTransition {
            from: SubscriptionStatus::Expired,
            event: LifecycleEvent::PaymentSucceeded,
        }
    );
    let reset = h.admin().reset(&sub.id).await.unwrap();
    assert_eq!(reset.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn cancelled_subscription_keeps_access_until_period_end() {
    let h = Harness::in_memory();
    let sub = h.create("tenant-1").await;

    h.clock.advance_days(5);
    let cancelled = h.billing(sub.id, BillingEvent::UserCancelled).await.unwrap();
    assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
    assert!(!cancelled.auto_renew);
    assert!(h.admin().inspect(&sub.id).await.unwrap().access.has_access);

    // Cancelled subscriptions get no renewal notice.
    h.clock.advance_days(22);
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.examined, 0);

    h.clock.advance_days(4);
    let report = h.expiry().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.transitioned, 1);
    assert_eq!(h.load(&sub.id).await.status, SubscriptionStatus::Expired);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn failed_dispatch_is_not_marked_and_is_retried_next_sweep() {
    let h = Harness::in_memory();
    let a = h.create("tenant-a").await;
    let b = h.create("tenant-b").await;
    h.clock.advance_days(28);
    h.dispatcher.fail_for(a.id);

    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, a.id);
    assert!(report.failures[0].error.is_retryable());
    assert_eq!(h.load(&a.id).await.renewal_notified_at, None);
    assert!(h.load(&b.id).await.notified_for_current_cycle());

    h.dispatcher.recover(&a.id);
    let report = h.notifications().run(h.now(), SweepOptions::apply()).await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.failures.is_empty());
    assert!(h.load(&a.id).await.notified_for_current_cycle());
}

#[tokio::test]
async fn dry_run_reports_without_writing_or_sending() {
    let h = Harness::in_memory();
    let lapsing = h.create("tenant-1").await;
    h.clock.advance_days(31);
    let due = h.create("tenant-2").await;
    h.clock.advance_days(27);

    let expiry = h.expiry().run(h.now(), SweepOptions::dry_run()).await.unwrap();
    assert_eq!(expiry.transitioned, 0);
    assert_eq!(expiry.planned.len(), 1);
    assert_eq!(expiry.planned[0].id, lapsing.id);
    assert_eq!(expiry.planned[0].to, SubscriptionStatus::Expired);

    let notices = h.notifications().run(h.now(), SweepOptions::dry_run()).await.unwrap();
    assert_eq!(notices.notified, 0);
    assert_eq!(notices.planned.len(), 1);
    assert_eq!(notices.planned[0].subscription_id, due.id);
    assert_eq!(h.dispatcher.attempts(), 0);

    assert_eq!(h.load(&lapsing.id).await.status, SubscriptionStatus::Active);
    assert_eq!(h.load(&lapsing.id).await.version, 0);
    assert_eq!(h.load(&due.id).await.renewal_notified_at, None);
}

// =============================================================================
// File-backed state
// =============================================================================

#[tokio::test]
async fn state_file_survives_across_repository_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("subscriptions.yaml");

    let first = Harness::new(Arc::new(FileSubscriptionRepository::new(&path)));
    let sub = first.create("tenant-1").await;
    first.clock.advance_days(3);
    first.billing(sub.id, BillingEvent::UserCancelled).await.unwrap();

    // A fresh process sees what the first one wrote.
    let second = Harness::new(Arc::new(FileSubscriptionRepository::new(&path)));
    second.clock.set(first.now());
    let loaded = second.load(&sub.id).await;
    assert_eq!(loaded.status, SubscriptionStatus::Cancelled);
    assert_eq!(loaded.version, 1);

    let resumed = second.billing(sub.id, BillingEvent::UserResumed).await.unwrap();
    assert_eq!(resumed.status, SubscriptionStatus::Active);
    assert!(resumed.auto_renew);
    assert_eq!(resumed.version, 2);

    let cancelled = second
        .repo
        .find_by_status(SubscriptionStatus::Cancelled, SubscriptionFilter::Any)
        .await
        .unwrap();
    assert!(cancelled.is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

/// Repository that lets another writer win the first save.
struct RacingRepository {
    inner: InMemorySubscriptionRepository,
    raced: AtomicBool,
}

#[async_trait]
impl SubscriptionRepository for RacingRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<SubscriptionState>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, state: &SubscriptionState) -> Result<(), DomainError> {
        self.inner.insert(state).await
    }

    async fn update(
        &self,
        state: &SubscriptionState,
        expected_version: i64,
    ) -> Result<SubscriptionState, DomainError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            // A notification sweep saves first.
            let current = self.inner.find_by_id(&state.id).await?.unwrap();
            let marked = RenewalScheduler::default().mark_notified(&current, current.updated_at);
            self.inner.update(&marked, current.version).await?;
        }
        self.inner.update(state, expected_version).await
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionState>, DomainError> {
        self.inner.find_by_status(status, filter).await
    }
}

#[tokio::test]
async fn billing_event_retries_after_losing_a_version_race() {
    let repo = Arc::new(RacingRepository {
        inner: InMemorySubscriptionRepository::new(),
        raced: AtomicBool::new(false),
    });
    let h = Harness::new(repo);
    let sub = h.create("tenant-1").await;
    h.clock.advance_days(2);

    let result = BillingEventHandler::new(h.repo.clone(), h.clock.clone(), TransitionEngine::default())
        .handle(BillingEventCommand {
            subscription_id: sub.id,
            event: BillingEvent::PaymentFailed,
        })
        .await
        .unwrap();

    assert_eq!(result.attempts, 2);
    assert_eq!(result.to, SubscriptionStatus::PastDue);

    // Both writes survive: the other writer's notice marker and our status change.
    let saved = h.load(&sub.id).await;
    assert_eq!(saved.status, SubscriptionStatus::PastDue);
    assert_eq!(saved.renewal_notification_count, 1);
    assert_eq!(saved.version, 2);
}
