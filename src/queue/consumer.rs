//! Consumer Protocol
//!
//! A [`QueueConsumer`] is bound to one (queue, consumer) pair and drives it
//! through the batch lifecycle:
//!
//! ```text
//! unregistered --register--> idle --next_batch--> batch open
//!      ^                       ^                      |
//!      +-----unregister--------+-----finish_batch-----+
//! ```
//!
//! Claiming is idempotent: asking for the next batch while one is open
//! returns the same batch id. Events are delivered at least once; an event
//! put back with [`QueueConsumer::event_retry`] or
//! [`QueueConsumer::batch_retry`] reappears in a later batch with a higher
//! retry count, and the current batch must still be finished.

use crate::core::validation::validate_identifier;
use crate::queue::error::QueueResult;
use crate::queue::executor::{SqlExecutor, Value};
use crate::queue::remote::Remote;
use crate::queue::sql;
use crate::queue::types::{BatchThresholds, Event, NextBatch, RetryAfter};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The two shapes of `pgq.get_batch_cursor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorRequest {
    /// Every event of the batch
    All,
    /// Only events matching a backend-evaluated condition
    Where(String),
}

impl CursorRequest {
    pub fn resolve(extra_where: Option<&str>) -> Self {
        match extra_where {
            Some(condition) => Self::Where(condition.to_string()),
            None => Self::All,
        }
    }

    fn statement(&self) -> &'static str {
        match self {
            Self::All => sql::GET_BATCH_CURSOR,
            Self::Where(_) => sql::GET_BATCH_CURSOR_WHERE,
        }
    }

    fn params(&self, batch_id: i64, cursor_name: &str, quick_limit: i32) -> Vec<Value> {
        let mut params = vec![
            Value::from(batch_id),
            Value::from(cursor_name),
            Value::from(quick_limit),
        ];
        if let Self::Where(condition) = self {
            params.push(Value::from(condition.as_str()));
        }
        params
    }
}

/// Protocol handle for one consumer of one queue
#[derive(Clone)]
pub struct QueueConsumer {
    remote: Remote,
    queue_name: String,
    consumer_name: String,
}

impl QueueConsumer {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        queue_name: impl Into<String>,
        consumer_name: impl Into<String>,
    ) -> Self {
        Self {
            remote: Remote::new(executor),
            queue_name: queue_name.into(),
            consumer_name: consumer_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    fn names(&self) -> [Value; 2] {
        [
            Value::from(self.queue_name.as_str()),
            Value::from(self.consumer_name.as_str()),
        ]
    }

    /// Register at the current position; false if already registered
    pub async fn register(&self) -> QueueResult<bool> {
        let registered = self
            .remote
            .flag(sql::REGISTER_CONSUMER, &self.names())
            .await?;
        self.log_registration(registered, None);
        Ok(registered)
    }

    /// Register starting from a specific tick instead of the current one
    pub async fn register_at(&self, tick_id: i64) -> QueueResult<bool> {
        let [queue, consumer] = self.names();
        let registered = self
            .remote
            .flag(
                sql::REGISTER_CONSUMER_AT,
                &[queue, consumer, Value::from(tick_id)],
            )
            .await?;
        self.log_registration(registered, Some(tick_id));
        Ok(registered)
    }

    fn log_registration(&self, registered: bool, tick_id: Option<i64>) {
        if registered {
            match tick_id {
                Some(tick) => log::info!(
                    "Registered consumer '{}' on '{}' at tick {}",
                    self.consumer_name,
                    self.queue_name,
                    tick
                ),
                None => log::info!(
                    "Registered consumer '{}' on '{}'",
                    self.consumer_name,
                    self.queue_name
                ),
            }
        } else {
            log::debug!(
                "Consumer '{}' already registered on '{}'",
                self.consumer_name,
                self.queue_name
            );
        }
    }

    /// Unregister; false if the consumer did not exist
    ///
    /// Finish any open batch first. Whether the backend refuses otherwise is
    /// up to the backend.
    pub async fn unregister(&self) -> QueueResult<bool> {
        let removed = self
            .remote
            .flag(sql::UNREGISTER_CONSUMER, &self.names())
            .await?;
        if removed {
            log::info!(
                "Unregistered consumer '{}' from '{}'",
                self.consumer_name,
                self.queue_name
            );
        }
        Ok(removed)
    }

    /// Claim the next batch (or return the open one) with tick metadata
    pub async fn next_batch_info(&self) -> QueueResult<NextBatch> {
        let batch = self
            .remote
            .row::<NextBatch>(sql::NEXT_BATCH_INFO, &self.names())
            .await?
            .unwrap_or_default();
        self.log_claim(batch.batch_id);
        Ok(batch)
    }

    /// Claim the next batch (or return the open one); `None` when idle
    pub async fn next_batch(&self) -> QueueResult<Option<i64>> {
        let batch_id: Option<i64> = self.remote.scalar(sql::NEXT_BATCH, &self.names()).await?;
        self.log_claim(batch_id);
        Ok(batch_id)
    }

    /// Claim with advisory thresholds the backend's batching policy applies
    pub async fn next_batch_custom(&self, thresholds: BatchThresholds) -> QueueResult<NextBatch> {
        let [queue, consumer] = self.names();
        let params = [
            queue,
            consumer,
            Value::from(thresholds.min_lag),
            Value::from(thresholds.min_count),
            Value::from(thresholds.min_interval),
        ];
        let batch = self
            .remote
            .row::<NextBatch>(sql::NEXT_BATCH_CUSTOM, &params)
            .await?
            .unwrap_or_default();
        self.log_claim(batch.batch_id);
        Ok(batch)
    }

    fn log_claim(&self, batch_id: Option<i64>) {
        match batch_id {
            Some(id) => log::info!(
                "Consumer '{}' on '{}' holds batch {}",
                self.consumer_name,
                self.queue_name,
                id
            ),
            None => log::debug!(
                "No batch available for '{}' on '{}'",
                self.consumer_name,
                self.queue_name
            ),
        }
    }

    /// All events of an open batch; repeatable and read-only
    pub async fn get_batch_events(&self, batch_id: i64) -> QueueResult<Vec<Event>> {
        let events: Vec<Event> = self
            .remote
            .rows(sql::GET_BATCH_EVENTS, &[Value::from(batch_id)])
            .await?;
        log::debug!("Batch {} has {} event(s)", batch_id, events.len());
        Ok(events)
    }

    /// Open a cursor over a batch and return its first `quick_limit` events
    ///
    /// Continue with [`fetch_cursor`](Self::fetch_cursor) and release with
    /// [`close_cursor`](Self::close_cursor). The cursor lives in the backend
    /// transaction, so the executor must keep one connection for the whole
    /// walk.
    pub async fn get_batch_cursor(
        &self,
        batch_id: i64,
        cursor_name: &str,
        quick_limit: i32,
        extra_where: Option<&str>,
    ) -> QueueResult<Vec<Event>> {
        validate_cursor_name(cursor_name)?;
        let request = CursorRequest::resolve(extra_where);
        self.remote
            .rows(
                request.statement(),
                &request.params(batch_id, cursor_name, quick_limit),
            )
            .await
    }

    /// Next `count` events from an open batch cursor; empty when exhausted
    pub async fn fetch_cursor(&self, cursor_name: &str, count: i64) -> QueueResult<Vec<Event>> {
        validate_cursor_name(cursor_name)?;
        self.remote
            .rows(&sql::fetch_cursor(cursor_name, count), &[])
            .await
    }

    pub async fn close_cursor(&self, cursor_name: &str) -> QueueResult<()> {
        validate_cursor_name(cursor_name)?;
        self.remote.execute(&sql::close_cursor(cursor_name), &[]).await?;
        Ok(())
    }

    /// Put one event back for redelivery
    ///
    /// Exactly one of `retry_time` and `retry_seconds` must be given; both or
    /// neither is rejected before the backend is contacted. Returns false if
    /// the event was already scheduled for retry.
    pub async fn event_retry(
        &self,
        batch_id: i64,
        event_id: i64,
        retry_time: Option<DateTime<Utc>>,
        retry_seconds: Option<i32>,
    ) -> QueueResult<bool> {
        let retry = RetryAfter::resolve(retry_time, retry_seconds).map_err(|err| {
            log::warn!("Rejected retry of event {}: {}", event_id, err);
            err
        })?;
        self.event_retry_after(batch_id, event_id, retry).await
    }

    pub async fn event_retry_after(
        &self,
        batch_id: i64,
        event_id: i64,
        retry: RetryAfter,
    ) -> QueueResult<bool> {
        let statement = match retry {
            RetryAfter::At(_) => sql::EVENT_RETRY_AT,
            RetryAfter::Seconds(_) => sql::EVENT_RETRY_SECONDS,
        };
        let scheduled = self
            .remote
            .flag(
                statement,
                &[Value::from(batch_id), Value::from(event_id), retry.param()],
            )
            .await?;
        log::debug!(
            "Retry of event {} in batch {}: {}",
            event_id,
            batch_id,
            if scheduled { "scheduled" } else { "already pending" }
        );
        Ok(scheduled)
    }

    /// Put every event of the batch back; returns how many were affected
    ///
    /// The batch stays open until [`finish_batch`](Self::finish_batch).
    pub async fn batch_retry(&self, batch_id: i64, retry_seconds: i32) -> QueueResult<i64> {
        let count: i64 = self
            .remote
            .scalar(
                sql::BATCH_RETRY,
                &[Value::from(batch_id), Value::from(retry_seconds)],
            )
            .await?;
        log::info!(
            "Batch {} put back {} event(s) for retry in {}s",
            batch_id,
            count,
            retry_seconds
        );
        Ok(count)
    }

    /// Close the batch and advance the consumer; false on double finish
    pub async fn finish_batch(&self, batch_id: i64) -> QueueResult<bool> {
        let finished = self
            .remote
            .flag(sql::FINISH_BATCH, &[Value::from(batch_id)])
            .await?;
        if finished {
            log::info!(
                "Consumer '{}' on '{}' finished batch {}",
                self.consumer_name,
                self.queue_name,
                batch_id
            );
        } else {
            log::debug!("Batch {} was already finished", batch_id);
        }
        Ok(finished)
    }
}

fn validate_cursor_name(cursor_name: &str) -> QueueResult<()> {
    validate_identifier("cursor name", cursor_name).map_err(|err| {
        log::warn!("Rejected cursor request: {}", err);
        err.into()
    })
}
