//! Queue persistence boundary.
//!
//! The store's claim/mark semantics carry the pipeline's correctness under
//! overlapping cycles: fetches are scoped to `status = 'pending'` and
//! terminal writes are idempotent, so a record already flipped by a racing
//! cycle is simply absent from the next fetch and re-marking it is a no-op.

use sqlx::PgPool;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::QueuedNotification;

/// Persistence operations the dispatcher needs from the notification queue.
#[allow(async_fn_in_trait)]
pub trait QueueStore {
    /// Fetch up to `limit` pending records, oldest first.
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueuedNotification>, AppError>;

    /// Mark records as sent. Idempotent: records no longer pending are
    /// silently skipped, never an error.
    async fn mark_sent(&self, ids: &[Uuid]) -> Result<(), AppError>;

    /// Record a failed attempt. When `terminal` is false the record stays
    /// pending for a later cycle; when true it becomes a dead letter.
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        new_retry_count: i32,
        terminal: bool,
    ) -> Result<(), AppError>;

    /// Purge sent and dead records older than the retention window.
    /// Returns the number of rows deleted.
    async fn cleanup(&self) -> Result<u64, AppError>;
}

/// PostgreSQL-backed queue store.
#[derive(Clone)]
pub struct PgQueueStore {
    pool: PgPool,
    retention_days: i64,
}

impl PgQueueStore {
    pub fn new(pool: PgPool, retention_days: i64) -> Self {
        Self {
            pool,
            retention_days,
        }
    }
}

impl QueueStore for PgQueueStore {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueuedNotification>, AppError> {
        let records: Vec<QueuedNotification> = sqlx::query_as(
            r#"
            SELECT *
            FROM notifications
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn mark_sent(&self, ids: &[Uuid]) -> Result<(), AppError> {
        // Scoped to pending so a racing cycle's terminal write wins and this
        // becomes a no-op for already-settled rows.
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'sent', last_attempt_at = NOW(), last_error = NULL
            WHERE id = ANY($1) AND status = 'pending'
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            requested = ids.len(),
            updated = result.rows_affected(),
            "Marked notifications sent"
        );

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        new_retry_count: i32,
        terminal: bool,
    ) -> Result<(), AppError> {
        let status = if terminal { "failed" } else { "pending" };

        sqlx::query(
            r#"
            UPDATE notifications
            SET status = $1,
                retry_count = GREATEST(retry_count, $2),
                last_error = $3,
                last_attempt_at = NOW()
            WHERE id = $4 AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(new_retry_count)
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cleanup(&self) -> Result<u64, AppError> {
        // Retention keys on last_attempt_at, the moment a record became
        // terminal. Requeued records stay pending and are never touched here.
        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE status IN ('sent', 'failed')
              AND last_attempt_at < NOW() - make_interval(days => $1::int)
            "#,
        )
        .bind(self.retention_days)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, retention_days = self.retention_days, "Cleanup purged terminal notifications");
        }

        Ok(deleted)
    }
}
