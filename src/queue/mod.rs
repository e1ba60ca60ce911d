//! PgQ Client Protocol
//!
//! Client side of the PgQ transactional queue. The queue engine lives in
//! PostgreSQL and is reached only through its `pgq.*` functions; this module
//! wraps those calls with typed arguments and results and documents the order
//! producers and consumers must call them in.
//!
//! # Overview
//!
//! - **Execution boundary** ([`SqlExecutor`]): the only way statements reach
//!   the backend. Inject any implementation; [`PgExecutor`] ships for sqlx.
//! - **Administration** ([`QueueAdmin`]): create, drop, configure, inspect.
//! - **Producer** ([`QueueProducer`]): insert events.
//! - **Consumer** ([`QueueConsumer`]): register, claim, read, retry, finish.
//! - **Ticker** ([`QueueTicker`]): create batch boundaries on demand.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  insert_event   ┌──────────────────────────────┐
//! │  Producer  │ ──────────────▶ │            PgQ               │
//! └────────────┘                 │  events ─┬─ tick ─┬─ tick ─▶ │
//! ┌────────────┐  ticker         │          │ batch  │          │
//! │   Ticker   │ ──────────────▶ │          └────────┘          │
//! └────────────┘                 └──────────────▲───────────────┘
//! ┌────────────┐  next_batch / get_batch_events │
//! │  Consumer  │ ───────────────────────────────┘
//! └────────────┘  event_retry / finish_batch
//! ```
//!
//! Delivery is at least once. A consumer holds at most one open batch;
//! asking for the next batch while one is open returns it again.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pgq_client::queue::{PgqClient, SqlExecutor};
//! use std::sync::Arc;
//!
//! # async fn example(executor: Arc<dyn SqlExecutor>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = PgqClient::new(executor);
//!
//! client.admin().create_queue("orders").await?;
//! let consumer = client.consumer("orders", "billing");
//! consumer.register().await?;
//!
//! client
//!     .producer()
//!     .insert_event("orders", "order.created", "{\"id\":1}", None)
//!     .await?;
//! client.ticker().force_tick("orders").await?;
//!
//! if let Some(batch_id) = consumer.next_batch().await? {
//!     for event in consumer.get_batch_events(batch_id).await? {
//!         println!("{}: {:?}", event.ev_id, event.ev_data);
//!     }
//!     consumer.finish_batch(batch_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod admin;
mod client;
mod consumer;
mod error;
mod executor;
mod interval;
mod marshal;
mod processor;
mod producer;
mod remote;
mod sql;
mod ticker;
mod types;

#[cfg(feature = "postgres")]
mod postgres;

pub mod api;

pub use admin::{ConsumerInfoQuery, QueueAdmin, QueueInfoQuery};
pub use client::PgqClient;
pub use consumer::{CursorRequest, QueueConsumer};
pub use error::{QueueError, QueueResult};
pub use executor::{BackendError, BackendResult, Row, SqlExecutor, Value};
pub use interval::Interval;
pub use marshal::{pad_extra, InsertShape, EXTRA_FIELD_COUNT};
pub use processor::{
    BatchHandler, BatchProcessor, BatchReport, EventOutcome, HandlerError, ProcessError,
};
pub use producer::QueueProducer;
pub use ticker::{PollPolicy, QueueTicker, TickRequest};
pub use types::{
    BatchInfo, BatchThresholds, ConsumerInfo, Event, NewEvent, NextBatch, QueueInfo, RetryAfter,
};

#[cfg(feature = "postgres")]
pub use postgres::PgExecutor;
