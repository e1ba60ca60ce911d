//! Ticker
//!
//! Ticks are normally produced by the backend's own ticker process. These
//! calls are for queues without one, or for tests and tooling that need a
//! boundary right now.
//!
//! The backend takes its snapshot before any lock, so two tick requests for
//! the same queue racing each other are unsafe. Nothing here serializes them;
//! callers must not tick one queue from several places at once.

use crate::queue::error::QueueResult;
use crate::queue::executor::{SqlExecutor, Value};
use crate::queue::remote::Remote;
use crate::queue::sql;
use crate::queue::types::QueueInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// The two shapes of `pgq.ticker`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRequest {
    /// Create a tick only if the queue's thresholds say one is due
    IfDue,
    /// Insert a tick numbered by an external ticking process
    External(i64),
}

impl From<Option<i64>> for TickRequest {
    fn from(tick_id: Option<i64>) -> Self {
        match tick_id {
            Some(id) => Self::External(id),
            None => Self::IfDue,
        }
    }
}

/// How long [`QueueTicker::force_tick_and_wait`] keeps polling
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone)]
pub struct QueueTicker {
    remote: Remote,
}

impl QueueTicker {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            remote: Remote::new(executor),
        }
    }

    /// Ask the backend to produce a tick on its next ticker pass
    pub async fn force_tick(&self, queue_name: &str) -> QueueResult<i64> {
        let tick_id: i64 = self
            .remote
            .scalar(sql::FORCE_TICK, &[Value::from(queue_name)])
            .await?;
        log::info!("Forced tick on '{}' (tick {})", queue_name, tick_id);
        Ok(tick_id)
    }

    /// Run one ticker step; `None` when no tick was needed
    pub async fn ticker(&self, queue_name: &str, tick_id: Option<i64>) -> QueueResult<Option<i64>> {
        self.tick(queue_name, TickRequest::from(tick_id)).await
    }

    pub async fn tick(&self, queue_name: &str, request: TickRequest) -> QueueResult<Option<i64>> {
        let created: Option<i64> = match request {
            TickRequest::IfDue => {
                self.remote
                    .scalar(sql::TICKER, &[Value::from(queue_name)])
                    .await?
            }
            TickRequest::External(id) => {
                self.remote
                    .scalar(
                        sql::TICKER_EXTERNAL,
                        &[Value::from(queue_name), Value::from(id)],
                    )
                    .await?
            }
        };
        match created {
            Some(id) => log::info!("Created tick {} on '{}'", id, queue_name),
            None => log::debug!("No tick due on '{}'", queue_name),
        }
        Ok(created)
    }

    /// Force a tick and poll until the queue's last tick moves
    ///
    /// Returns the new last tick id, or `None` if it did not change within
    /// the policy's attempts.
    pub async fn force_tick_and_wait(
        &self,
        queue_name: &str,
        policy: PollPolicy,
    ) -> QueueResult<Option<i64>> {
        let before = self.last_tick_id(queue_name).await?;
        self.force_tick(queue_name).await?;

        for attempt in 0..policy.max_attempts {
            let current = self.last_tick_id(queue_name).await?;
            if current.is_some() && current != before {
                return Ok(current);
            }
            if attempt + 1 < policy.max_attempts {
                log::debug!(
                    "Waiting for tick on '{}', attempt {}/{}, retrying in {:?}",
                    queue_name,
                    attempt + 1,
                    policy.max_attempts,
                    policy.delay
                );
                sleep(policy.delay).await;
            }
        }

        log::warn!(
            "Tick on '{}' did not advance after {} attempt(s)",
            queue_name,
            policy.max_attempts
        );
        Ok(None)
    }

    async fn last_tick_id(&self, queue_name: &str) -> QueueResult<Option<i64>> {
        let info: Option<QueueInfo> = self
            .remote
            .row(sql::GET_QUEUE_INFO, &[Value::from(queue_name)])
            .await?;
        Ok(info.map(|info| info.last_tick_id))
    }
}
