//! Public API for the queue protocol
//!
//! External modules should import from here rather than from the individual
//! component modules.

// Components
pub use crate::queue::admin::QueueAdmin;
pub use crate::queue::client::PgqClient;
pub use crate::queue::consumer::QueueConsumer;
pub use crate::queue::producer::QueueProducer;
pub use crate::queue::ticker::{PollPolicy, QueueTicker};

// Batch processing
pub use crate::queue::processor::{BatchHandler, BatchProcessor, BatchReport, EventOutcome};

// Execution boundary
pub use crate::queue::executor::{BackendError, Row, SqlExecutor, Value};

// Records and request types
pub use crate::queue::interval::Interval;
pub use crate::queue::types::{
    BatchInfo, BatchThresholds, ConsumerInfo, Event, NewEvent, NextBatch, QueueInfo, RetryAfter,
};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

#[cfg(feature = "postgres")]
pub use crate::queue::postgres::PgExecutor;
