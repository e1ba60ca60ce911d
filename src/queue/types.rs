//! Type definitions for the queue protocol
//!
//! Records returned by the remote procedures keep the exact column names of
//! the PgQ result sets, plus the small request types callers build.

use crate::core::validation::ValidationError;
use crate::queue::error::QueueResult;
use crate::queue::executor::{Row, Value};
use crate::queue::interval::Interval;
use crate::queue::marshal::{column, FromRow};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Row of `pgq.get_queue_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueInfo {
    pub queue_name: String,
    pub queue_ntables: i32,
    pub queue_cur_table: i32,
    pub queue_rotation_period: Interval,
    pub queue_switch_time: DateTime<Utc>,
    pub queue_external_ticker: bool,
    pub queue_ticker_paused: bool,
    pub queue_ticker_max_count: i32,
    pub queue_ticker_max_lag: Interval,
    pub queue_ticker_idle_period: Interval,
    pub ticker_lag: Option<Interval>,
    pub ev_per_sec: Option<f64>,
    pub ev_new: i64,
    pub last_tick_id: i64,
}

impl FromRow for QueueInfo {
    fn from_row(row: &Row) -> QueueResult<Self> {
        Ok(Self {
            queue_name: column(row, "queue_name")?,
            queue_ntables: column(row, "queue_ntables")?,
            queue_cur_table: column(row, "queue_cur_table")?,
            queue_rotation_period: column(row, "queue_rotation_period")?,
            queue_switch_time: column(row, "queue_switch_time")?,
            queue_external_ticker: column(row, "queue_external_ticker")?,
            queue_ticker_paused: column(row, "queue_ticker_paused")?,
            queue_ticker_max_count: column(row, "queue_ticker_max_count")?,
            queue_ticker_max_lag: column(row, "queue_ticker_max_lag")?,
            queue_ticker_idle_period: column(row, "queue_ticker_idle_period")?,
            ticker_lag: column(row, "ticker_lag")?,
            ev_per_sec: column(row, "ev_per_sec")?,
            ev_new: column(row, "ev_new")?,
            last_tick_id: column(row, "last_tick_id")?,
        })
    }
}

/// Row of `pgq.get_consumer_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerInfo {
    pub queue_name: String,
    pub consumer_name: String,
    pub lag: Interval,
    pub last_seen: Interval,
    pub last_tick: i64,
    pub current_batch: Option<i64>,
    pub next_tick: Option<i64>,
    pub pending_events: Option<i64>,
}

impl FromRow for ConsumerInfo {
    fn from_row(row: &Row) -> QueueResult<Self> {
        Ok(Self {
            queue_name: column(row, "queue_name")?,
            consumer_name: column(row, "consumer_name")?,
            lag: column(row, "lag")?,
            last_seen: column(row, "last_seen")?,
            last_tick: column(row, "last_tick")?,
            current_batch: column(row, "current_batch")?,
            next_tick: column(row, "next_tick")?,
            pending_events: column(row, "pending_events")?,
        })
    }
}

/// Row of `pgq.next_batch_info` / `pgq.next_batch_custom`
///
/// Every field is NULL when there is nothing to batch yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NextBatch {
    pub batch_id: Option<i64>,
    pub cur_tick_id: Option<i64>,
    pub prev_tick_id: Option<i64>,
    pub cur_tick_time: Option<DateTime<Utc>>,
    pub prev_tick_time: Option<DateTime<Utc>>,
    pub cur_tick_event_seq: Option<i64>,
    pub prev_tick_event_seq: Option<i64>,
}

impl NextBatch {
    /// True when no batch was claimed; the consumer stays idle
    pub fn is_empty(&self) -> bool {
        self.batch_id.is_none()
    }
}

impl FromRow for NextBatch {
    fn from_row(row: &Row) -> QueueResult<Self> {
        Ok(Self {
            batch_id: column(row, "batch_id")?,
            cur_tick_id: column(row, "cur_tick_id")?,
            prev_tick_id: column(row, "prev_tick_id")?,
            cur_tick_time: column(row, "cur_tick_time")?,
            prev_tick_time: column(row, "prev_tick_time")?,
            cur_tick_event_seq: column(row, "cur_tick_event_seq")?,
            prev_tick_event_seq: column(row, "prev_tick_event_seq")?,
        })
    }
}

/// Row of `pgq.get_batch_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchInfo {
    pub queue_name: String,
    pub consumer_name: String,
    pub batch_start: DateTime<Utc>,
    pub batch_end: DateTime<Utc>,
    pub prev_tick_id: i64,
    pub tick_id: i64,
    pub lag: Interval,
    pub seq_start: i64,
    pub seq_end: i64,
}

impl FromRow for BatchInfo {
    fn from_row(row: &Row) -> QueueResult<Self> {
        Ok(Self {
            queue_name: column(row, "queue_name")?,
            consumer_name: column(row, "consumer_name")?,
            batch_start: column(row, "batch_start")?,
            batch_end: column(row, "batch_end")?,
            prev_tick_id: column(row, "prev_tick_id")?,
            tick_id: column(row, "tick_id")?,
            lag: column(row, "lag")?,
            seq_start: column(row, "seq_start")?,
            seq_end: column(row, "seq_end")?,
        })
    }
}

/// One event of a batch (`pgq.get_batch_events`, `pgq.get_batch_cursor`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub ev_id: i64,
    pub ev_time: DateTime<Utc>,
    pub ev_txid: i64,
    pub ev_retry: Option<i32>,
    pub ev_type: Option<String>,
    pub ev_data: Option<String>,
    pub ev_extra1: Option<String>,
    pub ev_extra2: Option<String>,
    pub ev_extra3: Option<String>,
    pub ev_extra4: Option<String>,
}

impl Event {
    pub fn extras(&self) -> [Option<&str>; 4] {
        [
            self.ev_extra1.as_deref(),
            self.ev_extra2.as_deref(),
            self.ev_extra3.as_deref(),
            self.ev_extra4.as_deref(),
        ]
    }

    /// Number of times this event was put back for redelivery
    pub fn retry_count(&self) -> i32 {
        self.ev_retry.unwrap_or(0)
    }
}

impl FromRow for Event {
    fn from_row(row: &Row) -> QueueResult<Self> {
        Ok(Self {
            ev_id: column(row, "ev_id")?,
            ev_time: column(row, "ev_time")?,
            ev_txid: column(row, "ev_txid")?,
            ev_retry: column(row, "ev_retry")?,
            ev_type: column(row, "ev_type")?,
            ev_data: column(row, "ev_data")?,
            ev_extra1: column(row, "ev_extra1")?,
            ev_extra2: column(row, "ev_extra2")?,
            ev_extra3: column(row, "ev_extra3")?,
            ev_extra4: column(row, "ev_extra4")?,
        })
    }
}

/// An event to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub ev_type: String,
    pub ev_data: String,
    pub extra: Option<Vec<Option<String>>>,
}

impl NewEvent {
    pub fn new(ev_type: impl Into<String>, ev_data: impl Into<String>) -> Self {
        Self {
            ev_type: ev_type.into(),
            ev_data: ev_data.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: Vec<Option<String>>) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// When a retried event should return to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfter {
    /// At a point in time
    At(DateTime<Utc>),
    /// After a delay in seconds
    Seconds(i32),
}

impl RetryAfter {
    /// Resolve the two optional timing arguments; exactly one must be set
    pub fn resolve(
        retry_time: Option<DateTime<Utc>>,
        retry_seconds: Option<i32>,
    ) -> Result<Self, ValidationError> {
        match (retry_time, retry_seconds) {
            (Some(time), None) => Ok(Self::At(time)),
            (None, Some(seconds)) => Ok(Self::Seconds(seconds)),
            (Some(_), Some(_)) => Err(ValidationError::new(
                "Only one of retry_time and retry_seconds may be provided",
            )),
            (None, None) => Err(ValidationError::new(
                "One of retry_time or retry_seconds must be provided",
            )),
        }
    }

    pub(crate) fn param(&self) -> Value {
        match self {
            Self::At(time) => Value::Timestamp(*time),
            Self::Seconds(seconds) => Value::from(*seconds),
        }
    }
}

/// Advisory thresholds for `pgq.next_batch_custom`
///
/// Unset thresholds are sent as NULL and leave the decision to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchThresholds {
    /// Only take events older than this
    pub min_lag: Option<Interval>,
    /// Wait until the batch would hold at least this many events
    pub min_count: Option<i32>,
    /// Wait until the batch covers at least this much time
    pub min_interval: Option<Interval>,
}
