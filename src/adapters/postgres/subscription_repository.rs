//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Optimistic concurrency is a single statement: the `UPDATE` matches on
//! both `id` and `version`, and a miss is disambiguated afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{BillingInterval, SubscriptionState, SubscriptionStatus};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

const COLUMNS: &str = "id, user_id, status, billing_interval, starts_at, ends_at, cancelled_at, \
     grace_period_ends_at, auto_renew, renewal_notified_at, renewal_notified_for, \
     renewal_notification_count, version, created_at, updated_at";

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &SubscriptionId) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM subscriptions WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("check subscription", e))
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    status: String,
    billing_interval: String,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    grace_period_ends_at: Option<DateTime<Utc>>,
    auto_renew: bool,
    renewal_notified_at: Option<DateTime<Utc>>,
    renewal_notified_for: Option<DateTime<Utc>>,
    renewal_notification_count: i32,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionState {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, reason: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, reason))
                .with_detail("subscription_id", row.id.to_string())
        };

        let status = row
            .status
            .parse::<SubscriptionStatus>()
            .map_err(|e| corrupt("status", e.to_string()))?;
        let billing_interval = row
            .billing_interval
            .parse::<BillingInterval>()
            .map_err(|e| corrupt("billing_interval", e.to_string()))?;
        let user_id =
            UserId::new(row.user_id.clone()).map_err(|e| corrupt("user_id", e.to_string()))?;
        let renewal_notification_count = u32::try_from(row.renewal_notification_count)
            .map_err(|e| corrupt("renewal_notification_count", e.to_string()))?;

        Ok(SubscriptionState {
            id: SubscriptionId::from_uuid(row.id),
            user_id,
            status,
            billing_interval,
            starts_at: Timestamp::from_datetime(row.starts_at),
            ends_at: row.ends_at.map(Timestamp::from_datetime),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            grace_period_ends_at: row.grace_period_ends_at.map(Timestamp::from_datetime),
            auto_renew: row.auto_renew,
            renewal_notified_at: row.renewal_notified_at.map(Timestamp::from_datetime),
            renewal_notified_for: row.renewal_notified_for.map(Timestamp::from_datetime),
            renewal_notification_count,
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {}: {}", action, err),
    )
}

fn to_datetime(ts: Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Extra WHERE clause for a filter, plus the `now` it binds as `$2`.
fn filter_clause(filter: &SubscriptionFilter) -> (&'static str, Option<DateTime<Utc>>) {
    match filter {
        SubscriptionFilter::Any => ("", None),
        SubscriptionFilter::GraceElapsed { now } => (
            "AND (grace_period_ends_at IS NULL OR grace_period_ends_at <= $2)",
            Some(*now.as_datetime()),
        ),
        SubscriptionFilter::EndsAtSet => ("AND ends_at IS NOT NULL", None),
        SubscriptionFilter::EndsAtBefore { now } => (
            "AND ends_at IS NOT NULL AND ends_at <= $2",
            Some(*now.as_datetime()),
        ),
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<SubscriptionState>, DomainError> {
        let sql = format!("SELECT {} FROM subscriptions WHERE id = $1", COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find subscription", e))?;

        row.map(SubscriptionState::try_from).transpose()
    }

    async fn insert(&self, state: &SubscriptionState) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, status, billing_interval, starts_at, ends_at, cancelled_at,
                grace_period_ends_at, auto_renew, renewal_notified_at, renewal_notified_for,
                renewal_notification_count, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(state.id.as_uuid())
        .bind(state.user_id.as_str())
        .bind(state.status.as_str())
        .bind(state.billing_interval.as_str())
        .bind(state.starts_at.as_datetime())
        .bind(to_datetime(state.ends_at))
        .bind(to_datetime(state.cancelled_at))
        .bind(to_datetime(state.grace_period_ends_at))
        .bind(state.auto_renew)
        .bind(to_datetime(state.renewal_notified_at))
        .bind(to_datetime(state.renewal_notified_for))
        .bind(count_to_db(state.renewal_notification_count))
        .bind(state.version)
        .bind(state.created_at.as_datetime())
        .bind(state.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23505") {
                    return DomainError::validation("id", "Subscription already exists");
                }
            }
            db_error("insert subscription", e)
        })?;

        Ok(())
    }

    async fn update(
        &self,
        state: &SubscriptionState,
        expected_version: i64,
    ) -> Result<SubscriptionState, DomainError> {
        let sql = format!(
            r#"
            UPDATE subscriptions SET
                user_id = $3,
                status = $4,
                billing_interval = $5,
                starts_at = $6,
                ends_at = $7,
                cancelled_at = $8,
                grace_period_ends_at = $9,
                auto_renew = $10,
                renewal_notified_at = $11,
                renewal_notified_for = $12,
                renewal_notification_count = $13,
                updated_at = $14,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            COLUMNS
        );

        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(state.id.as_uuid())
            .bind(expected_version)
            .bind(state.user_id.as_str())
            .bind(state.status.as_str())
            .bind(state.billing_interval.as_str())
            .bind(state.starts_at.as_datetime())
            .bind(to_datetime(state.ends_at))
            .bind(to_datetime(state.cancelled_at))
            .bind(to_datetime(state.grace_period_ends_at))
            .bind(state.auto_renew)
            .bind(to_datetime(state.renewal_notified_at))
            .bind(to_datetime(state.renewal_notified_for))
            .bind(count_to_db(state.renewal_notification_count))
            .bind(state.updated_at.as_datetime())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("update subscription", e))?;

        match row {
            Some(row) => SubscriptionState::try_from(row),
            None if self.exists(&state.id).await? => Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "subscription {} is no longer at version {}",
                    state.id, expected_version
                ),
            )),
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", state.id),
            )),
        }
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionState>, DomainError> {
        let (clause, now) = filter_clause(&filter);
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE status = $1 {} ORDER BY id",
            COLUMNS, clause
        );

        let mut query = sqlx::query_as::<_, SubscriptionRow>(&sql).bind(status.as_str());
        if let Some(now) = now {
            query = query.bind(now);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list subscriptions", e))?;

        rows.into_iter().map(SubscriptionState::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-01T00:00:00Z").unwrap()
    }

    fn row() -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: "tenant-1".to_string(),
            status: "past_due".to_string(),
            billing_interval: "annual".to_string(),
            starts_at: *now().as_datetime(),
            ends_at: Some(*now().add_days(365).as_datetime()),
            cancelled_at: None,
            grace_period_ends_at: Some(*now().add_days(3).as_datetime()),
            auto_renew: true,
            renewal_notified_at: None,
            renewal_notified_for: None,
            renewal_notification_count: 2,
            version: 9,
            created_at: *now().as_datetime(),
            updated_at: *now().as_datetime(),
        }
    }

    #[test]
    fn row_converts_to_state() {
        let state = SubscriptionState::try_from(row()).unwrap();

        assert_eq!(state.status, SubscriptionStatus::PastDue);
        assert_eq!(state.billing_interval, BillingInterval::Annual);
        assert_eq!(state.grace_period_ends_at, Some(now().add_days(3)));
        assert_eq!(state.renewal_notification_count, 2);
        assert_eq!(state.version, 9);
    }

    #[test]
    fn unknown_status_is_a_database_error() {
        let mut bad = row();
        bad.status = "paused".to_string();

        let err = SubscriptionState::try_from(bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut bad = row();
        bad.renewal_notification_count = -1;
        assert!(SubscriptionState::try_from(bad).is_err());
    }

    #[test]
    fn filters_bind_now_only_when_needed() {
        assert_eq!(filter_clause(&SubscriptionFilter::Any), ("", None));
        assert_eq!(filter_clause(&SubscriptionFilter::EndsAtSet).1, None);

        let (clause, bound) = filter_clause(&SubscriptionFilter::GraceElapsed { now: now() });
        assert!(clause.contains("grace_period_ends_at <= $2"));
        assert_eq!(bound, Some(*now().as_datetime()));

        let (clause, _) = filter_clause(&SubscriptionFilter::EndsAtBefore { now: now() });
        assert!(clause.contains("ends_at <= $2"));
    }

    #[test]
    fn count_saturates_into_column() {
        assert_eq!(count_to_db(3), 3);
        assert_eq!(count_to_db(u32::MAX), i32::MAX);
    }
}
