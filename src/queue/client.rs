//! Client facade
//!
//! Holds the injected executor and hands out component handles that share
//! it. There is no global client; build one per backend and pass it around.

use crate::queue::admin::QueueAdmin;
use crate::queue::consumer::QueueConsumer;
use crate::queue::executor::SqlExecutor;
use crate::queue::producer::QueueProducer;
use crate::queue::ticker::QueueTicker;
use std::sync::Arc;

#[derive(Clone)]
pub struct PgqClient {
    executor: Arc<dyn SqlExecutor>,
}

impl PgqClient {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> Arc<dyn SqlExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn admin(&self) -> QueueAdmin {
        QueueAdmin::new(self.executor())
    }

    pub fn producer(&self) -> QueueProducer {
        QueueProducer::new(self.executor())
    }

    pub fn consumer(&self, queue_name: &str, consumer_name: &str) -> QueueConsumer {
        QueueConsumer::new(self.executor(), queue_name, consumer_name)
    }

    pub fn ticker(&self) -> QueueTicker {
        QueueTicker::new(self.executor())
    }
}
