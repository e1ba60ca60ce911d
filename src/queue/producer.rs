//! Event producer

use crate::queue::error::QueueResult;
use crate::queue::executor::SqlExecutor;
use crate::queue::marshal::InsertShape;
use crate::queue::remote::Remote;
use crate::queue::types::NewEvent;
use std::sync::Arc;

/// Inserts events into named queues
///
/// Each insert is its own remote call. Callers that need several events to
/// land atomically must run them inside one transaction held by the executor.
#[derive(Clone)]
pub struct QueueProducer {
    remote: Remote,
}

impl QueueProducer {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            remote: Remote::new(executor),
        }
    }

    /// Insert one event and return its id
    ///
    /// Supplying `extra` (even empty) selects the four-extra call shape; more
    /// than four entries is rejected before the backend is contacted.
    pub async fn insert_event(
        &self,
        queue_name: &str,
        ev_type: &str,
        ev_data: &str,
        extra: Option<&[Option<String>]>,
    ) -> QueueResult<i64> {
        let shape = InsertShape::resolve(extra).map_err(|err| {
            log::warn!("Rejected event for queue '{}': {}", queue_name, err);
            err
        })?;

        let ev_id: i64 = self
            .remote
            .scalar(shape.statement(), &shape.params(queue_name, ev_type, ev_data))
            .await?;
        log::trace!("Inserted event {} into '{}'", ev_id, queue_name);
        Ok(ev_id)
    }

    /// Insert events one after another, returning their ids in order
    ///
    /// Stops at the first failure; events inserted before it stay inserted
    /// unless the executor's transaction is rolled back.
    pub async fn insert_events<I>(&self, queue_name: &str, events: I) -> QueueResult<Vec<i64>>
    where
        I: IntoIterator<Item = NewEvent>,
    {
        let mut ids = Vec::new();
        for event in events {
            let id = self
                .insert_event(
                    queue_name,
                    &event.ev_type,
                    &event.ev_data,
                    event.extra.as_deref(),
                )
                .await?;
            ids.push(id);
        }
        log::debug!("Inserted {} event(s) into '{}'", ids.len(), queue_name);
        Ok(ids)
    }
}
