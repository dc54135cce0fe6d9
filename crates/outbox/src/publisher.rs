//! Relaying committed outbox entries to the event bus.

use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use common::CorrelationId;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use store::{Condition, FieldChange, ScanFilter, TransactionalStore, TransactionalStoreExt, WriteOp};

use crate::Result;
use crate::bus::{BusEvent, EventBus};
use crate::entry::{
    CORRELATION_ID_FIELD, OutboxEntry, OutboxStatus, STATUS_FIELD, UPDATED_AT_FIELD,
};
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Publisher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Source tag stamped on every bus event.
    pub source: String,
    pub retry: RetryPolicy,
    /// Upper bound on entries delivered concurrently within one pass.
    pub max_concurrency: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            source: "order-service".to_string(),
            retry: RetryPolicy::default(),
            max_concurrency: 16,
        }
    }
}

/// Per-entry results of one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
    /// Entries claimed by a concurrent pass before this one reached them.
    pub skipped: usize,
}

impl PublishReport {
    /// Returns the number of entries the pass looked at.
    pub fn total(&self) -> usize {
        self.published + self.failed + self.skipped
    }

    /// Adds the counts of another report to this one.
    pub fn merge(&mut self, other: PublishReport) {
        self.published += other.published;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    fn record(mut self, outcome: EntryOutcome) -> Self {
        match outcome {
            EntryOutcome::Published => self.published += 1,
            EntryOutcome::Failed => self.failed += 1,
            EntryOutcome::Skipped => self.skipped += 1,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Published,
    Failed,
    Skipped,
}

/// Delivers outbox entries to an [`EventBus`].
///
/// A pass runs after the originating commit and is not atomic with it. Each
/// entry is claimed by a conditional `NOT_PUBLISHED` → `IN_PROGRESS` write,
/// so overlapping passes never deliver the same entry twice; the pass that
/// loses the claim skips it. Delivery is retried under the configured
/// [`RetryPolicy`]. A delivered entry becomes `PUBLISHED`, one that exhausts
/// its retries becomes `FAILED`. Entry outcomes are isolated: one entry's
/// failure never fails the pass.
pub struct EventPublisher<S, B> {
    store: S,
    bus: B,
    table: String,
    config: PublisherConfig,
}

impl<S: TransactionalStore, B: EventBus> EventPublisher<S, B> {
    /// Creates a publisher relaying entries of `table` to `bus`.
    pub fn new(store: S, bus: B, table: impl Into<String>, config: PublisherConfig) -> Self {
        Self {
            store,
            bus,
            table: table.into(),
            config,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Publishes the unpublished entries written under `correlation_id`.
    ///
    /// Entries of other invocations are left untouched. Calling this again
    /// once everything is settled is a no-op.
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    pub async fn publish(&self, correlation_id: CorrelationId) -> Result<PublishReport> {
        let filter = ScanFilter::new()
            .where_eq(STATUS_FIELD, OutboxStatus::NotPublished.as_str())
            .where_eq(CORRELATION_ID_FIELD, correlation_id.to_string());
        self.relay(filter).await
    }

    /// Publishes every unpublished entry regardless of correlation id.
    ///
    /// Recovers entries whose invocation committed but never got to publish.
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    pub async fn publish_pending(&self) -> Result<PublishReport> {
        let filter = ScanFilter::new().where_eq(STATUS_FIELD, OutboxStatus::NotPublished.as_str());
        self.relay(filter).await
    }

    /// Releases `IN_PROGRESS` claims not touched for at least `max_age`.
    ///
    /// Released entries return to `NOT_PUBLISHED`. Returns the distinct
    /// correlation ids affected so the caller can publish them again.
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    pub async fn reap_stale(&self, max_age: Duration) -> Result<Vec<CorrelationId>> {
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(Vec::new());
        };

        let filter = ScanFilter::new().where_eq(STATUS_FIELD, OutboxStatus::InProgress.as_str());
        let documents = self.store.scan(&self.table, &filter).await?;

        let mut released = Vec::new();
        for document in documents {
            let claimed_at = document.get(UPDATED_AT_FIELD).cloned().unwrap_or(Value::Null);
            let entry: OutboxEntry = match serde_json::from_value(document) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed outbox entry");
                    continue;
                }
            };
            if entry.updated_at > cutoff {
                continue;
            }

            let op = WriteOp::update(
                &self.table,
                entry.id.as_str(),
                status_changes(OutboxStatus::NotPublished, Utc::now()),
            )
            .when(Condition::field_equals(
                STATUS_FIELD,
                OutboxStatus::InProgress.to_value(),
            ))
            .when(Condition::field_equals(UPDATED_AT_FIELD, claimed_at));

            match self.store.write(op).await {
                Ok(()) => {
                    metrics::counter!("outbox_claims_released_total").increment(1);
                    tracing::info!(entry_id = %entry.id, correlation_id = %entry.correlation_id, "released stale claim");
                    if !released.contains(&entry.correlation_id) {
                        released.push(entry.correlation_id);
                    }
                }
                Err(error) if error.is_condition_failed() => {
                    tracing::debug!(entry_id = %entry.id, "claim changed while reaping");
                }
                Err(error) => {
                    tracing::error!(entry_id = %entry.id, %error, "failed to release stale claim");
                }
            }
        }

        Ok(released)
    }

    async fn relay(&self, filter: ScanFilter) -> Result<PublishReport> {
        let started = Instant::now();
        let documents = self.store.scan(&self.table, &filter).await?;
        if documents.is_empty() {
            tracing::debug!("no outbox entries to publish");
            return Ok(PublishReport::default());
        }

        let report = stream::iter(documents)
            .map(|document| self.deliver(document))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .fold(PublishReport::default(), |report, outcome| async move {
                report.record(outcome)
            })
            .await;

        metrics::histogram!("outbox_publish_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            published = report.published,
            failed = report.failed,
            skipped = report.skipped,
            "publish pass complete"
        );
        Ok(report)
    }

    async fn deliver(&self, document: Value) -> EntryOutcome {
        let entry: OutboxEntry = match serde_json::from_value(document) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::error!(%error, "malformed outbox entry");
                metrics::counter!("outbox_events_failed_total").increment(1);
                return EntryOutcome::Failed;
            }
        };

        if let Err(error) = self
            .transition(&entry, OutboxStatus::NotPublished, OutboxStatus::InProgress)
            .await
        {
            if error.is_condition_failed() {
                tracing::debug!(entry_id = %entry.id, "entry already claimed");
                metrics::counter!("outbox_events_skipped_total").increment(1);
                return EntryOutcome::Skipped;
            }
            tracing::error!(entry_id = %entry.id, %error, "failed to claim outbox entry");
            return EntryOutcome::Failed;
        }

        let event = BusEvent {
            source: self.config.source.clone(),
            detail_type: entry.name.clone(),
            detail: entry.payload.clone(),
        };
        let bus = &self.bus;
        let delivered = retry_with_backoff(&self.config.retry, |attempt| {
            let event = event.clone();
            async move {
                tracing::debug!(attempt, detail_type = %event.detail_type, "delivering event");
                bus.publish(event).await
            }
        })
        .await;

        match delivered {
            Ok(()) => {
                metrics::counter!("outbox_events_published_total").increment(1);
                tracing::info!(entry_id = %entry.id, name = %entry.name, "outbox entry published");
                if let Err(error) = self
                    .transition(&entry, OutboxStatus::InProgress, OutboxStatus::Published)
                    .await
                {
                    tracing::error!(entry_id = %entry.id, %error, "delivered entry could not be marked published");
                }
                EntryOutcome::Published
            }
            Err(error) => {
                metrics::counter!("outbox_events_failed_total").increment(1);
                tracing::error!(
                    entry_id = %entry.id,
                    name = %entry.name,
                    correlation_id = %entry.correlation_id,
                    attempts = self.config.retry.attempts(),
                    %error,
                    "outbox entry failed"
                );
                if let Err(error) = self
                    .transition(&entry, OutboxStatus::InProgress, OutboxStatus::Failed)
                    .await
                {
                    tracing::error!(entry_id = %entry.id, %error, "failed entry could not be marked failed");
                }
                EntryOutcome::Failed
            }
        }
    }

    async fn transition(
        &self,
        entry: &OutboxEntry,
        from: OutboxStatus,
        to: OutboxStatus,
    ) -> store::Result<()> {
        let op = WriteOp::update(&self.table, entry.id.as_str(), status_changes(to, Utc::now()))
            .when(Condition::field_equals(STATUS_FIELD, from.to_value()));
        self.store.write(op).await
    }
}

fn status_changes(status: OutboxStatus, at: DateTime<Utc>) -> Vec<FieldChange> {
    vec![
        FieldChange::new(STATUS_FIELD, status.to_value()),
        FieldChange::new(
            UPDATED_AT_FIELD,
            Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        ),
    ]
}
