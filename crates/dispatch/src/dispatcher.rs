//! The dispatch cycle — fetch, group, render, send, record, clean up.
//!
//! Invoked by an external scheduler with no mutual-exclusion guarantee, so
//! the loop assumes at-least-once execution of the cycle itself and pushes
//! at-most-once delivery per notification onto the store's claim/mark
//! semantics. One record or bucket failing never escapes the loop; only a
//! failed initial fetch aborts the cycle.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::{Cadence, QueuedNotification, Recipient};
use courier_render::{build_digest, render};

use crate::delivery::DeliveryClient;
use crate::grouper::{Bucket, group_by_recipient};
use crate::resolver::RecipientResolver;
use crate::retry::{DispatchError, RetryPolicy};
use crate::store::QueueStore;

/// Attempts at persisting a successful send before giving up. The email is
/// already out at that point, so only the mark is retried — never the send.
const MARK_ATTEMPTS: u32 = 3;

/// Delay between mark attempts.
const MARK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Outcome of one complete dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub cleaned: u64,
}

/// Orchestrates one drain of the notification queue per invocation.
pub struct Dispatcher<S, R, D> {
    store: S,
    resolver: R,
    delivery: D,
    retry: RetryPolicy,
}

impl<S, R, D> Dispatcher<S, R, D>
where
    S: QueueStore,
    R: RecipientResolver,
    D: DeliveryClient,
{
    pub fn new(store: S, resolver: R, delivery: D, retry: RetryPolicy) -> Self {
        Self {
            store,
            resolver,
            delivery,
            retry,
        }
    }

    /// Run one complete drain cycle over at most `batch_limit` records.
    pub async fn run_cycle(&self, batch_limit: i64) -> Result<CycleSummary, AppError> {
        let batch = self.store.fetch_pending(batch_limit).await?;
        if batch.is_empty() {
            tracing::debug!("No pending notifications, cycle is a no-op");
            return Ok(CycleSummary::default());
        }

        let processed = batch.len();
        tracing::info!(processed, "Dispatch cycle started");

        let mut sent = 0;
        let mut failed = 0;
        for bucket in group_by_recipient(batch) {
            let (bucket_sent, bucket_failed) = match bucket.cadence {
                Cadence::Instant => self.process_instant(&bucket).await,
                Cadence::HourlyDigest | Cadence::DailyDigest => {
                    self.process_digest(&bucket).await
                }
            };
            sent += bucket_sent;
            failed += bucket_failed;
        }

        let cleaned = match self.store.cleanup().await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Cleanup failed, deferring to next cycle");
                0
            }
        };

        tracing::info!(processed, sent, failed, cleaned, "Dispatch cycle finished");
        Ok(CycleSummary {
            processed,
            sent,
            failed,
            cleaned,
        })
    }

    /// Instant bucket: every record rendered, sent, and marked on its own so
    /// one bad payload cannot block its siblings.
    async fn process_instant(&self, bucket: &Bucket) -> (usize, usize) {
        let recipient = match self.resolver.resolve(bucket.recipient_id).await {
            Ok(r) => r,
            Err(e) => {
                // Resolution failure applies to every record addressed to
                // this user, each marked individually.
                for record in &bucket.items {
                    self.record_failure(record, &e).await;
                }
                return (0, bucket.items.len());
            }
        };

        let mut sent = 0;
        let mut failed = 0;
        for record in &bucket.items {
            match self.send_single(record, &recipient).await {
                Ok(()) => {
                    self.mark_sent_with_retries(&[record.id]).await;
                    sent += 1;
                }
                Err(e) => {
                    self.record_failure(record, &e).await;
                    failed += 1;
                }
            }
        }
        (sent, failed)
    }

    async fn send_single(
        &self,
        record: &QueuedNotification,
        recipient: &Recipient,
    ) -> Result<(), DispatchError> {
        let message = render(&record.kind, &record.payload)?;
        self.delivery
            .send(&recipient.email, &message.subject, &message.body)
            .await?;

        tracing::info!(
            id = %record.id,
            kind = %record.kind,
            recipient = %record.recipient_id,
            "Instant notification sent"
        );
        Ok(())
    }

    /// Digest bucket: one resolve, one aggregated message, one send, then
    /// all-or-nothing marking so a partial bucket is never re-sent in full.
    async fn process_digest(&self, bucket: &Bucket) -> (usize, usize) {
        let count = bucket.items.len();

        let recipient = match self.resolver.resolve(bucket.recipient_id).await {
            Ok(r) => r,
            Err(e) => {
                for record in &bucket.items {
                    self.record_failure(record, &e).await;
                }
                return (0, count);
            }
        };

        // The grouper never emits an empty bucket; guard anyway.
        let Some(message) = build_digest(bucket.cadence, &bucket.items) else {
            return (0, 0);
        };

        match self
            .delivery
            .send(&recipient.email, &message.subject, &message.body)
            .await
        {
            Ok(()) => {
                let ids: Vec<Uuid> = bucket.items.iter().map(|r| r.id).collect();
                self.mark_sent_with_retries(&ids).await;
                tracing::info!(
                    recipient = %bucket.recipient_id,
                    cadence = %bucket.cadence,
                    items = count,
                    "Digest sent"
                );
                (count, 0)
            }
            Err(e) => {
                for record in &bucket.items {
                    self.record_failure(record, &e).await;
                }
                (0, count)
            }
        }
    }

    /// Persist a per-record failure: requeue while the policy allows it,
    /// dead-letter otherwise.
    async fn record_failure(&self, record: &QueuedNotification, error: &DispatchError) {
        let terminal = !self.retry.should_retry(record.retry_count, error);

        tracing::warn!(
            id = %record.id,
            kind = %record.kind,
            retry_count = record.retry_count,
            terminal,
            error = %error,
            "Notification delivery failed"
        );

        if let Err(e) = self
            .store
            .mark_failed(record.id, &error.to_string(), record.retry_count + 1, terminal)
            .await
        {
            tracing::error!(id = %record.id, error = %e, "Could not persist failure state");
        }
    }

    /// Persist a successful send, retrying the mark alone on store errors.
    /// If every attempt fails the records stay pending and the next cycle
    /// may deliver a duplicate — the accepted edge of at-most-once on the
    /// happy path.
    async fn mark_sent_with_retries(&self, ids: &[Uuid]) {
        for attempt in 1..=MARK_ATTEMPTS {
            match self.store.mark_sent(ids).await {
                Ok(()) => return,
                Err(e) if attempt < MARK_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "mark_sent failed, retrying");
                    tokio::time::sleep(MARK_RETRY_DELAY).await;
                }
                Err(e) => {
                    tracing::error!(
                        records = ids.len(),
                        error = %e,
                        "mark_sent exhausted retries, records remain pending"
                    );
                }
            }
        }
    }
}
