//! Batch processing helper
//!
//! Runs one full claim cycle for a consumer: claim, read, hand each event to
//! a [`BatchHandler`], schedule the retries it asks for, then finish. A
//! handler failure leaves the batch open, so the next claim returns the same
//! batch and every event in it is delivered again.

use crate::queue::consumer::QueueConsumer;
use crate::queue::error::QueueError;
use crate::queue::types::{Event, RetryAfter};
use async_trait::async_trait;
use serde::Serialize;

/// What the handler decided for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Done,
    Retry(RetryAfter),
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application logic applied to each event of a batch
///
/// Delivery is at least once: the same event id can arrive again after a
/// retry or an aborted cycle, so handlers must tolerate duplicates.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<EventOutcome, HandlerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Handler failed on event {event_id} of batch {batch_id}: {source}")]
    Handler {
        batch_id: i64,
        event_id: i64,
        #[source]
        source: HandlerError,
    },
}

/// Summary of one finished claim cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_id: i64,
    pub events: usize,
    pub retried: usize,
    /// False when the backend did not close the batch, e.g. it was already
    /// finished elsewhere; the consumer position did not move
    pub finished: bool,
}

pub struct BatchProcessor<H> {
    consumer: QueueConsumer,
    handler: H,
}

impl<H: BatchHandler> BatchProcessor<H> {
    pub fn new(consumer: QueueConsumer, handler: H) -> Self {
        Self { consumer, handler }
    }

    pub fn consumer(&self) -> &QueueConsumer {
        &self.consumer
    }

    /// Process the next batch; `None` when there was nothing to claim
    pub async fn process_next(&self) -> Result<Option<BatchReport>, ProcessError> {
        let Some(batch_id) = self.consumer.next_batch().await? else {
            return Ok(None);
        };

        let events = self.consumer.get_batch_events(batch_id).await?;
        let mut retried = 0;

        for event in &events {
            let outcome = self.handler.handle(event).await.map_err(|source| {
                log::error!(
                    "Handler failed on event {} of batch {}, leaving batch open",
                    event.ev_id,
                    batch_id
                );
                ProcessError::Handler {
                    batch_id,
                    event_id: event.ev_id,
                    source,
                }
            })?;

            if let EventOutcome::Retry(retry) = outcome {
                if self
                    .consumer
                    .event_retry_after(batch_id, event.ev_id, retry)
                    .await?
                {
                    retried += 1;
                }
            }
        }

        let finished = self.consumer.finish_batch(batch_id).await?;
        if !finished {
            log::warn!("Batch {} was not finished by the backend", batch_id);
        }

        Ok(Some(BatchReport {
            batch_id,
            events: events.len(),
            retried,
            finished,
        }))
    }
}
