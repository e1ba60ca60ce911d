//! Remote procedure statements
//!
//! One constant per call shape. Casts pin the overload PostgreSQL resolves
//! when the bound parameter type alone would be ambiguous or too wide.

// Administration
pub const CREATE_QUEUE: &str = "SELECT pgq.create_queue($1)";
pub const DROP_QUEUE: &str = "SELECT pgq.drop_queue($1, $2)";
pub const SET_QUEUE_CONFIG: &str = "SELECT pgq.set_queue_config($1, $2, $3)";
pub const CURRENT_EVENT_TABLE: &str = "SELECT pgq.current_event_table($1)";
pub const VERSION: &str = "SELECT pgq.version()";
pub const GET_QUEUE_INFO_ALL: &str = "SELECT * FROM pgq.get_queue_info()";
pub const GET_QUEUE_INFO: &str = "SELECT * FROM pgq.get_queue_info($1)";
pub const QUEUE_NAMES: &str = "SELECT queue_name FROM pgq.get_queue_info()";
pub const GET_CONSUMER_INFO_ALL: &str = "SELECT * FROM pgq.get_consumer_info()";
pub const GET_CONSUMER_INFO_QUEUE: &str = "SELECT * FROM pgq.get_consumer_info($1)";
pub const GET_CONSUMER_INFO: &str = "SELECT * FROM pgq.get_consumer_info($1, $2)";
pub const GET_BATCH_INFO: &str = "SELECT * FROM pgq.get_batch_info($1)";

// Producer
pub const INSERT_EVENT: &str = "SELECT pgq.insert_event($1, $2, $3)";
pub const INSERT_EVENT_EXTRA: &str = "SELECT pgq.insert_event($1, $2, $3, $4, $5, $6, $7)";

// Consumer
pub const REGISTER_CONSUMER: &str = "SELECT pgq.register_consumer($1, $2)";
pub const REGISTER_CONSUMER_AT: &str = "SELECT pgq.register_consumer_at($1, $2, $3::bigint)";
pub const UNREGISTER_CONSUMER: &str = "SELECT pgq.unregister_consumer($1, $2)";
pub const NEXT_BATCH_INFO: &str = "SELECT * FROM pgq.next_batch_info($1, $2)";
pub const NEXT_BATCH: &str = "SELECT pgq.next_batch($1, $2)";
pub const NEXT_BATCH_CUSTOM: &str =
    "SELECT * FROM pgq.next_batch_custom($1, $2, $3::interval, $4::integer, $5::interval)";
pub const GET_BATCH_EVENTS: &str = "SELECT * FROM pgq.get_batch_events($1)";
pub const GET_BATCH_CURSOR: &str = "SELECT * FROM pgq.get_batch_cursor($1, $2, $3::integer)";
pub const GET_BATCH_CURSOR_WHERE: &str =
    "SELECT * FROM pgq.get_batch_cursor($1, $2, $3::integer, $4)";
pub const EVENT_RETRY_AT: &str = "SELECT pgq.event_retry($1, $2, $3::timestamptz)";
pub const EVENT_RETRY_SECONDS: &str = "SELECT pgq.event_retry($1, $2, $3::integer)";
pub const BATCH_RETRY: &str = "SELECT pgq.batch_retry($1, $2::integer)";
pub const FINISH_BATCH: &str = "SELECT pgq.finish_batch($1)";

// Ticker
pub const FORCE_TICK: &str = "SELECT pgq.force_tick($1)";
pub const TICKER: &str = "SELECT pgq.ticker($1)";
pub const TICKER_EXTERNAL: &str = "SELECT pgq.ticker($1, $2::bigint)";

/// `FETCH` from an open batch cursor; the name must already be validated
pub fn fetch_cursor(cursor_name: &str, count: i64) -> String {
    format!("FETCH {} FROM {}", count, cursor_name)
}

/// `CLOSE` an open batch cursor; the name must already be validated
pub fn close_cursor(cursor_name: &str) -> String {
    format!("CLOSE {}", cursor_name)
}

/// Name of the remote procedure a statement calls, for logging
pub fn procedure_name(statement: &str) -> &str {
    statement
        .split_once("pgq.")
        .and_then(|(_, rest)| rest.split_once('('))
        .map(|(name, _)| name)
        .unwrap_or(statement)
}
