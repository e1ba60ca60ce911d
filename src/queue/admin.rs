//! Queue administration
//!
//! Create, drop and configure queues, and inspect queue, consumer and batch
//! metadata. Every read goes to the backend; nothing is cached.

use crate::core::validation::ValidationError;
use crate::queue::error::QueueResult;
use crate::queue::executor::{SqlExecutor, Value};
use crate::queue::remote::Remote;
use crate::queue::sql;
use crate::queue::types::{BatchInfo, ConsumerInfo, QueueInfo};
use std::sync::Arc;

/// Which queues `pgq.get_queue_info` should describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueInfoQuery {
    All,
    One(String),
}

impl QueueInfoQuery {
    fn statement(&self) -> &'static str {
        match self {
            Self::All => sql::GET_QUEUE_INFO_ALL,
            Self::One(_) => sql::GET_QUEUE_INFO,
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            Self::All => Vec::new(),
            Self::One(queue_name) => vec![Value::from(queue_name.as_str())],
        }
    }
}

impl From<Option<&str>> for QueueInfoQuery {
    fn from(queue_name: Option<&str>) -> Self {
        match queue_name {
            Some(name) => Self::One(name.to_string()),
            None => Self::All,
        }
    }
}

/// Which consumers `pgq.get_consumer_info` should describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerInfoQuery {
    /// Every consumer of every queue
    All,
    /// Every consumer of one queue
    Queue(String),
    /// One consumer of one queue
    Consumer { queue: String, consumer: String },
}

impl ConsumerInfoQuery {
    /// Resolve the optional queue/consumer pair into a call shape
    ///
    /// A consumer name without a queue name is rejected.
    pub fn resolve(
        queue_name: Option<&str>,
        consumer_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match (queue_name, consumer_name) {
            (None, None) => Ok(Self::All),
            (Some(queue), None) => Ok(Self::Queue(queue.to_string())),
            (Some(queue), Some(consumer)) => Ok(Self::Consumer {
                queue: queue.to_string(),
                consumer: consumer.to_string(),
            }),
            (None, Some(_)) => Err(ValidationError::new(
                "queue_name must be provided if consumer_name is provided",
            )),
        }
    }

    fn statement(&self) -> &'static str {
        match self {
            Self::All => sql::GET_CONSUMER_INFO_ALL,
            Self::Queue(_) => sql::GET_CONSUMER_INFO_QUEUE,
            Self::Consumer { .. } => sql::GET_CONSUMER_INFO,
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            Self::All => Vec::new(),
            Self::Queue(queue) => vec![Value::from(queue.as_str())],
            Self::Consumer { queue, consumer } => {
                vec![Value::from(queue.as_str()), Value::from(consumer.as_str())]
            }
        }
    }
}

/// Administrative handle over an injected executor
#[derive(Clone)]
pub struct QueueAdmin {
    remote: Remote,
}

impl QueueAdmin {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            remote: Remote::new(executor),
        }
    }

    /// Create a queue; returns false when it already existed
    pub async fn create_queue(&self, queue_name: &str) -> QueueResult<bool> {
        let created = self
            .remote
            .flag(sql::CREATE_QUEUE, &[Value::from(queue_name)])
            .await?;
        if created {
            log::info!("Created queue '{}'", queue_name);
        } else {
            log::debug!("Queue '{}' already exists", queue_name);
        }
        Ok(created)
    }

    /// Drop a queue and all its storage
    ///
    /// The backend refuses while consumers are registered unless `force` is
    /// set, and raises for an unknown queue.
    pub async fn drop_queue(&self, queue_name: &str, force: bool) -> QueueResult<()> {
        self.remote
            .value(sql::DROP_QUEUE, &[Value::from(queue_name), Value::from(force)])
            .await?;
        log::info!("Dropped queue '{}' (force: {})", queue_name, force);
        Ok(())
    }

    /// Set one configuration parameter (e.g. `ticker_max_count`)
    pub async fn set_queue_config(
        &self,
        queue_name: &str,
        param_name: &str,
        param_value: &str,
    ) -> QueueResult<()> {
        self.remote
            .value(
                sql::SET_QUEUE_CONFIG,
                &[
                    Value::from(queue_name),
                    Value::from(param_name),
                    Value::from(param_value),
                ],
            )
            .await?;
        log::info!(
            "Set {}={} on queue '{}'",
            param_name,
            param_value,
            queue_name
        );
        Ok(())
    }

    /// Describe one queue or all queues
    ///
    /// The one-queue shape yields at most one record.
    pub async fn get_queue_info(&self, queue_name: Option<&str>) -> QueueResult<Vec<QueueInfo>> {
        let query = QueueInfoQuery::from(queue_name);
        match &query {
            QueueInfoQuery::All => {
                self.remote
                    .rows(query.statement(), &query.params())
                    .await
            }
            QueueInfoQuery::One(_) => Ok(self
                .remote
                .row(query.statement(), &query.params())
                .await?
                .into_iter()
                .collect()),
        }
    }

    pub async fn queue_info(&self, queue_name: &str) -> QueueResult<Option<QueueInfo>> {
        Ok(self.get_queue_info(Some(queue_name)).await?.into_iter().next())
    }

    pub async fn all_queue_info(&self) -> QueueResult<Vec<QueueInfo>> {
        self.get_queue_info(None).await
    }

    /// Names of all queues, in backend order
    pub async fn queue_names(&self) -> QueueResult<Vec<String>> {
        self.remote
            .scalars(sql::QUEUE_NAMES, &[])
            .await
    }

    /// Name of the physical table currently receiving the queue's events
    pub async fn current_event_table(&self, queue_name: &str) -> QueueResult<String> {
        self.remote
            .scalar(sql::CURRENT_EVENT_TABLE, &[Value::from(queue_name)])
            .await
    }

    /// Version string of the PgQ installation
    pub async fn version(&self) -> QueueResult<String> {
        self.remote.scalar(sql::VERSION, &[]).await
    }

    /// Timing, lag and sequence range of a batch the backend still knows
    pub async fn get_batch_info(&self, batch_id: i64) -> QueueResult<Option<BatchInfo>> {
        self.remote
            .row(sql::GET_BATCH_INFO, &[Value::from(batch_id)])
            .await
    }

    /// Describe consumers; see [`ConsumerInfoQuery::resolve`] for the shapes
    pub async fn get_consumer_info(
        &self,
        queue_name: Option<&str>,
        consumer_name: Option<&str>,
    ) -> QueueResult<Vec<ConsumerInfo>> {
        let query = ConsumerInfoQuery::resolve(queue_name, consumer_name).map_err(|err| {
            log::warn!("Rejected consumer info request: {}", err);
            err
        })?;
        self.consumers(&query).await
    }

    pub async fn consumers(&self, query: &ConsumerInfoQuery) -> QueueResult<Vec<ConsumerInfo>> {
        match query {
            ConsumerInfoQuery::Consumer { .. } => Ok(self
                .remote
                .row(query.statement(), &query.params())
                .await?
                .into_iter()
                .collect()),
            _ => {
                self.remote
                    .rows(query.statement(), &query.params())
                    .await
            }
        }
    }

    pub async fn consumer_info(
        &self,
        queue_name: &str,
        consumer_name: &str,
    ) -> QueueResult<Option<ConsumerInfo>> {
        let query = ConsumerInfoQuery::Consumer {
            queue: queue_name.to_string(),
            consumer: consumer_name.to_string(),
        };
        Ok(self.consumers(&query).await?.into_iter().next())
    }
}
