//! CLI display utilities for formatting output
//!
//! Records render as prettytable tables, or as JSON with `--json`.

use crate::core::styles::StyleRole;
use crate::queue::{BatchInfo, ConsumerInfo, QueueInfo};
use prettytable::{format, Cell, Row, Table};
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub color: bool,
}

impl Output {
    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a one-line status message
    pub fn status(&self, role: StyleRole, message: &str) {
        println!("{}", role.paint(message, self.color));
    }
}

fn cell(text: impl ToString, role: StyleRole, color: bool) -> Cell {
    let cell = Cell::new(&text.to_string());
    match role.to_prettytable_spec() {
        Some(spec) if color => cell.style_spec(spec),
        _ => cell,
    }
}

fn titles(names: &[&str], color: bool) -> Row {
    Row::new(
        names
            .iter()
            .map(|name| cell(name, StyleRole::Header, color))
            .collect(),
    )
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// One row per queue
pub fn queue_table(queues: &[QueueInfo], color: bool) -> Table {
    let mut table = new_table();
    table.set_titles(titles(
        &[
            "Queue", "Tables", "Current", "Rotation", "Ticker", "Max count", "Max lag",
            "Idle", "Ticker lag", "Ev/s", "New", "Last tick",
        ],
        color,
    ));

    for queue in queues {
        let ticker = match (queue.queue_external_ticker, queue.queue_ticker_paused) {
            (_, true) => cell("paused", StyleRole::Warning, color),
            (true, false) => cell("external", StyleRole::Value, color),
            (false, false) => cell("internal", StyleRole::Value, color),
        };
        table.add_row(Row::new(vec![
            cell(&queue.queue_name, StyleRole::Key, color),
            Cell::new(&queue.queue_ntables.to_string()),
            Cell::new(&queue.queue_cur_table.to_string()),
            Cell::new(&queue.queue_rotation_period.to_string()),
            ticker,
            Cell::new(&queue.queue_ticker_max_count.to_string()),
            Cell::new(&queue.queue_ticker_max_lag.to_string()),
            Cell::new(&queue.queue_ticker_idle_period.to_string()),
            Cell::new(&optional(queue.ticker_lag)),
            Cell::new(&optional(queue.ev_per_sec.map(|rate| format!("{:.2}", rate)))),
            Cell::new(&queue.ev_new.to_string()),
            Cell::new(&queue.last_tick_id.to_string()),
        ]));
    }
    table
}

/// One row per consumer
pub fn consumer_table(consumers: &[ConsumerInfo], color: bool) -> Table {
    let mut table = new_table();
    table.set_titles(titles(
        &[
            "Queue", "Consumer", "Lag", "Last seen", "Last tick", "Batch", "Next tick",
            "Pending",
        ],
        color,
    ));

    for consumer in consumers {
        let batch = match consumer.current_batch {
            Some(id) => cell(id, StyleRole::Success, color),
            None => cell("-", StyleRole::Dim, color),
        };
        table.add_row(Row::new(vec![
            cell(&consumer.queue_name, StyleRole::Key, color),
            cell(&consumer.consumer_name, StyleRole::Key, color),
            Cell::new(&consumer.lag.to_string()),
            Cell::new(&consumer.last_seen.to_string()),
            Cell::new(&consumer.last_tick.to_string()),
            batch,
            Cell::new(&optional(consumer.next_tick)),
            Cell::new(&optional(consumer.pending_events)),
        ]));
    }
    table
}

/// Field/value pairs for one batch
pub fn batch_info_table(batch_id: i64, info: &BatchInfo, color: bool) -> Table {
    let mut table = new_table();
    let batch_title = batch_id.to_string();
    table.set_titles(titles(&["Batch", batch_title.as_str()], color));

    let fields: [(&str, String); 9] = [
        ("queue", info.queue_name.clone()),
        ("consumer", info.consumer_name.clone()),
        ("start", info.batch_start.to_rfc3339()),
        ("end", info.batch_end.to_rfc3339()),
        ("prev tick", info.prev_tick_id.to_string()),
        ("tick", info.tick_id.to_string()),
        ("lag", info.lag.to_string()),
        ("seq start", info.seq_start.to_string()),
        ("seq end", info.seq_end.to_string()),
    ];
    for (name, value) in fields {
        table.add_row(Row::new(vec![
            cell(name, StyleRole::Key, color),
            Cell::new(&value),
        ]));
    }
    table
}
