use std::sync::Arc;

use conduit_core::RoutingDecision;
use tokio::sync::mpsc;

use crate::{Outcome, UsageError, UsageRecord, UsageStore};

/// Builds usage records and persists them synchronously
#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn UsageStore>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Record the outcome of an executed decision
    ///
    /// Errors are persisted the same as successes. The record is returned
    /// even to callers that ignore persistence, so the store's error is
    /// the only failure mode.
    pub async fn log_usage(
        &self,
        user_id: &str,
        decision: &RoutingDecision,
        outcome: &Outcome,
    ) -> Result<UsageRecord, UsageError> {
        let record = UsageRecord::new(user_id, decision, outcome);
        self.persist(&record).await?;
        Ok(record)
    }

    /// Append an already built record
    pub async fn persist(&self, record: &UsageRecord) -> Result<(), UsageError> {
        self.store.append(record).await?;

        tracing::debug!(
            user_id = %record.user_id,
            provider = %record.provider_id,
            model = %record.model_id,
            status = ?record.status,
            cost = record.cost,
            latency_ms = record.latency_ms,
            "usage recorded"
        );

        Ok(())
    }
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder").finish_non_exhaustive()
    }
}

/// Fire-and-forget recorder backed by a background task
///
/// Records are sent over an unbounded channel so recording never blocks
/// the caller. The task runs until every sender is dropped.
#[derive(Clone)]
pub struct BackgroundRecorder {
    tx: mpsc::UnboundedSender<UsageRecord>,
}

impl BackgroundRecorder {
    /// Spawn the background task; must be called inside a tokio runtime
    pub fn spawn(store: Arc<dyn UsageStore>) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(process_records(rx, store));
        (Self { tx }, handle)
    }

    /// Enqueue a record
    ///
    /// If the background task has stopped the record is dropped with a
    /// warning.
    pub fn record(&self, record: UsageRecord) {
        if let Err(e) = self.tx.send(record) {
            tracing::warn!(
                record_id = %e.0.id,
                "failed to enqueue usage record, channel closed"
            );
        }
    }
}

impl std::fmt::Debug for BackgroundRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRecorder").finish_non_exhaustive()
    }
}

async fn process_records(mut rx: mpsc::UnboundedReceiver<UsageRecord>, store: Arc<dyn UsageStore>) {
    while let Some(record) = rx.recv().await {
        if let Err(e) = store.append(&record).await {
            tracing::warn!(
                error = %e,
                record_id = %record.id,
                user_id = %record.user_id,
                provider = %record.provider_id,
                "failed to persist usage record"
            );
        }
    }

    tracing::debug!("usage recorder shutting down");
}
