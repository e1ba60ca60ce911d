//! Common test utilities and helpers
//!
//! [`MemoryPgq`] simulates the PgQ engine closely enough to drive the client
//! through whole lifecycles: queues, ticks, consumers, batches, the retry
//! queue and batch cursors. It understands exactly the statements the client
//! sends and fails loudly on anything else.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use pgq_client::queue::{BackendError, BackendResult, Interval, PgqClient, Row, SqlExecutor, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Error raised by the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PgqError(pub String);

fn fail<T>(message: impl Into<String>) -> BackendResult<T> {
    Err(BackendError::new(PgqError(message.into())))
}

/// Backend error message, if `err` came from [`MemoryPgq`]
pub fn backend_message(err: &pgq_client::queue::QueueError) -> Option<String> {
    err.backend()
        .and_then(|backend| backend.downcast_ref::<PgqError>())
        .map(|error| error.0.clone())
}

#[derive(Debug, Clone)]
struct StoredEvent {
    ev_id: i64,
    ev_time: DateTime<Utc>,
    ev_txid: i64,
    ev_retry: Option<i32>,
    ev_type: String,
    ev_data: String,
    extra: [Option<String>; 4],
}

impl StoredEvent {
    fn to_row(&self) -> Row {
        Row::new()
            .with("ev_id", self.ev_id)
            .with("ev_time", self.ev_time)
            .with("ev_txid", self.ev_txid)
            .with("ev_retry", self.ev_retry)
            .with("ev_type", self.ev_type.as_str())
            .with("ev_data", self.ev_data.as_str())
            .with("ev_extra1", self.extra[0].clone())
            .with("ev_extra2", self.extra[1].clone())
            .with("ev_extra3", self.extra[2].clone())
            .with("ev_extra4", self.extra[3].clone())
    }
}

#[derive(Debug, Clone)]
struct Tick {
    id: i64,
    time: DateTime<Utc>,
    /// Event sequence value when the tick was taken
    event_seq: i64,
    /// Number of stored events (including re-queued retries) at the tick
    position: usize,
}

#[derive(Debug, Clone)]
struct Subscription {
    last_tick: i64,
    batch: Option<i64>,
    last_seen: DateTime<Utc>,
}

#[derive(Debug)]
struct QueueState {
    id: i64,
    events: Vec<StoredEvent>,
    ticks: Vec<Tick>,
    seq_value: i64,
    seq_called: bool,
    consumers: BTreeMap<String, Subscription>,
    retry: Vec<(DateTime<Utc>, StoredEvent)>,
    config: BTreeMap<String, String>,
    switch_time: DateTime<Utc>,
}

impl QueueState {
    fn new(id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            events: Vec::new(),
            ticks: vec![Tick {
                id: 1,
                time: now,
                event_seq: 1,
                position: 0,
            }],
            seq_value: 1,
            seq_called: false,
            consumers: BTreeMap::new(),
            retry: Vec::new(),
            config: BTreeMap::new(),
            switch_time: now,
        }
    }

    fn next_ev_id(&mut self) -> i64 {
        if self.seq_called {
            self.seq_value += 1;
        } else {
            self.seq_called = true;
        }
        self.seq_value
    }

    fn last_tick(&self) -> &Tick {
        &self.ticks[self.ticks.len() - 1]
    }

    fn tick_by_id(&self, id: i64) -> Option<&Tick> {
        self.ticks.iter().find(|tick| tick.id == id)
    }

    fn ev_new(&self) -> i64 {
        self.seq_value - self.last_tick().event_seq
    }

    fn has_due_retries(&self, now: DateTime<Utc>) -> bool {
        self.retry.iter().any(|(due, _)| *due <= now)
    }

    /// Move due retries back into the event stream, then record a tick
    fn take_tick(&mut self, id: i64) -> i64 {
        let now = Utc::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.retry.drain(..).partition(|(at, _)| *at <= now);
        self.retry = pending;
        for (_, event) in due {
            self.events.push(event);
        }
        self.ticks.push(Tick {
            id,
            time: now,
            event_seq: self.seq_value,
            position: self.events.len(),
        });
        id
    }

    fn info_row(&self, name: &str) -> Row {
        let ticker_lag = Utc::now() - self.last_tick().time;
        Row::new()
            .with("queue_name", name)
            .with("queue_ntables", 3i32)
            .with("queue_cur_table", 0i32)
            .with("queue_rotation_period", Interval::from_hms(2, 0, 0))
            .with("queue_switch_time", self.switch_time)
            .with("queue_external_ticker", false)
            .with("queue_ticker_paused", false)
            .with("queue_ticker_max_count", 500i32)
            .with("queue_ticker_max_lag", Interval::from_secs(3))
            .with("queue_ticker_idle_period", Interval::from_secs(60))
            .with("ticker_lag", Interval::from_secs(ticker_lag.num_seconds()))
            .with("ev_per_sec", Value::Null)
            .with("ev_new", self.ev_new())
            .with("last_tick_id", self.last_tick().id)
    }
}

#[derive(Debug, Clone)]
struct BatchState {
    queue: String,
    consumer: String,
    prev_tick: i64,
    cur_tick: i64,
    finished: bool,
    retried: HashSet<i64>,
}

#[derive(Debug, Default)]
struct Engine {
    queues: BTreeMap<String, QueueState>,
    batches: BTreeMap<i64, BatchState>,
    cursors: BTreeMap<String, VecDeque<Row>>,
    next_queue_id: i64,
    next_batch_id: i64,
    next_txid: i64,
}

impl Engine {
    fn queue_mut(&mut self, name: &str) -> BackendResult<&mut QueueState> {
        match self.queues.get_mut(name) {
            Some(queue) => Ok(queue),
            None => fail(format!("No such event queue: {}", name)),
        }
    }

    fn queue(&self, name: &str) -> BackendResult<&QueueState> {
        match self.queues.get(name) {
            Some(queue) => Ok(queue),
            None => fail(format!("No such event queue: {}", name)),
        }
    }

    fn open_batch(&self, batch_id: i64) -> BackendResult<&BatchState> {
        match self.batches.get(&batch_id) {
            Some(batch) if !batch.finished => Ok(batch),
            _ => fail(format!("batch not found: {}", batch_id)),
        }
    }

    fn create_queue(&mut self, name: &str) -> Value {
        if self.queues.contains_key(name) {
            return Value::Int(0);
        }
        self.next_queue_id += 1;
        let queue = QueueState::new(self.next_queue_id);
        self.queues.insert(name.to_string(), queue);
        Value::Int(1)
    }

    fn drop_queue(&mut self, name: &str, force: bool) -> BackendResult<Value> {
        let queue = self.queue(name)?;
        if !force && !queue.consumers.is_empty() {
            return fail(format!("cannot drop queue {}, consumers still attached", name));
        }
        self.queues.remove(name);
        self.batches.retain(|_, batch| batch.queue != name);
        Ok(Value::Int(1))
    }

    fn set_queue_config(&mut self, name: &str, param: &str, value: &str) -> BackendResult<Value> {
        const KNOWN: [&str; 6] = [
            "ticker_max_count",
            "ticker_max_lag",
            "ticker_idle_period",
            "ticker_paused",
            "rotation_period",
            "external_ticker",
        ];
        let key = param.strip_prefix("queue_").unwrap_or(param);
        if !KNOWN.contains(&key) {
            return fail(format!("cannot change parameter \"{}\"", param));
        }
        let queue = self.queue_mut(name)?;
        queue.config.insert(key.to_string(), value.to_string());
        Ok(Value::Int(1))
    }

    fn insert_event(
        &mut self,
        name: &str,
        ev_type: &str,
        ev_data: &str,
        extra: [Option<String>; 4],
    ) -> BackendResult<Value> {
        self.next_txid += 1;
        let txid = self.next_txid;
        let queue = self.queue_mut(name)?;
        let ev_id = queue.next_ev_id();
        queue.events.push(StoredEvent {
            ev_id,
            ev_time: Utc::now(),
            ev_txid: txid,
            ev_retry: None,
            ev_type: ev_type.to_string(),
            ev_data: ev_data.to_string(),
            extra,
        });
        Ok(Value::Int(ev_id))
    }

    fn register(&mut self, name: &str, consumer: &str, at: Option<i64>) -> BackendResult<Value> {
        let queue = self.queue_mut(name)?;
        if queue.consumers.contains_key(consumer) {
            return Ok(Value::Int(0));
        }
        let last_tick = match at {
            Some(tick_id) if queue.tick_by_id(tick_id).is_none() => {
                return fail(format!("cannot find tick {} on queue {}", tick_id, name));
            }
            Some(tick_id) => tick_id,
            None => queue.last_tick().id,
        };
        queue.consumers.insert(
            consumer.to_string(),
            Subscription {
                last_tick,
                batch: None,
                last_seen: Utc::now(),
            },
        );
        Ok(Value::Int(1))
    }

    fn unregister(&mut self, name: &str, consumer: &str) -> BackendResult<Value> {
        let queue = self.queue_mut(name)?;
        match queue.consumers.remove(consumer) {
            Some(sub) => {
                if let Some(batch_id) = sub.batch {
                    self.batches.remove(&batch_id);
                }
                Ok(Value::Int(1))
            }
            None => Ok(Value::Int(0)),
        }
    }

    /// Claim (or return) the consumer's batch; `None` when there is no new tick
    fn claim(
        &mut self,
        name: &str,
        consumer: &str,
        min_count: Option<i64>,
    ) -> BackendResult<Option<i64>> {
        let queue = self.queue(name)?;
        let Some(sub) = queue.consumers.get(consumer) else {
            return fail(format!("Not subscriber to queue: {}/{}", name, consumer));
        };
        if let Some(batch_id) = sub.batch {
            return Ok(Some(batch_id));
        }

        let Some(prev) = queue.tick_by_id(sub.last_tick) else {
            return fail(format!("lost position for {}/{}", name, consumer));
        };
        let Some(next) = queue.ticks.iter().find(|tick| tick.id > sub.last_tick) else {
            return Ok(None);
        };
        if let Some(min) = min_count {
            let pending = queue.last_tick().position.saturating_sub(prev.position);
            if (pending as i64) < min {
                return Ok(None);
            }
        }
        let (prev_tick, cur_tick) = (prev.id, next.id);

        self.next_batch_id += 1;
        let batch_id = self.next_batch_id;
        self.batches.insert(
            batch_id,
            BatchState {
                queue: name.to_string(),
                consumer: consumer.to_string(),
                prev_tick,
                cur_tick,
                finished: false,
                retried: HashSet::new(),
            },
        );
        let sub = self
            .queue_mut(name)?
            .consumers
            .get_mut(consumer)
            .ok_or_else(|| BackendError::new(PgqError("subscription vanished".to_string())))?;
        sub.batch = Some(batch_id);
        sub.last_seen = Utc::now();
        Ok(Some(batch_id))
    }

    fn next_batch_row(&self, batch_id: Option<i64>) -> BackendResult<Row> {
        let Some(batch_id) = batch_id else {
            return Ok(Row::new()
                .with("batch_id", Value::Null)
                .with("cur_tick_id", Value::Null)
                .with("prev_tick_id", Value::Null)
                .with("cur_tick_time", Value::Null)
                .with("prev_tick_time", Value::Null)
                .with("cur_tick_event_seq", Value::Null)
                .with("prev_tick_event_seq", Value::Null));
        };
        let (batch, prev, cur) = self.batch_ticks(batch_id)?;
        Ok(Row::new()
            .with("batch_id", batch_id)
            .with("cur_tick_id", batch.cur_tick)
            .with("prev_tick_id", batch.prev_tick)
            .with("cur_tick_time", cur.time)
            .with("prev_tick_time", prev.time)
            .with("cur_tick_event_seq", cur.event_seq)
            .with("prev_tick_event_seq", prev.event_seq))
    }

    fn batch_ticks(&self, batch_id: i64) -> BackendResult<(&BatchState, &Tick, &Tick)> {
        let batch = self.open_batch(batch_id)?;
        let queue = self.queue(&batch.queue)?;
        match (queue.tick_by_id(batch.prev_tick), queue.tick_by_id(batch.cur_tick)) {
            (Some(prev), Some(cur)) => Ok((batch, prev, cur)),
            _ => fail(format!("batch not found: {}", batch_id)),
        }
    }

    fn batch_events(&self, batch_id: i64) -> BackendResult<Vec<StoredEvent>> {
        let (batch, prev, cur) = self.batch_ticks(batch_id)?;
        let queue = self.queue(&batch.queue)?;
        Ok(queue.events[prev.position..cur.position].to_vec())
    }

    fn batch_cursor(
        &mut self,
        batch_id: i64,
        cursor: &str,
        quick_limit: i64,
        condition: Option<&str>,
    ) -> BackendResult<Vec<Row>> {
        if self.cursors.contains_key(cursor) {
            return fail(format!("cursor \"{}\" already exists", cursor));
        }
        let filter = match condition {
            Some(text) => Some(parse_type_condition(text)?),
            None => None,
        };
        let mut rows: VecDeque<Row> = self
            .batch_events(batch_id)?
            .into_iter()
            .filter(|event| filter.as_deref().map_or(true, |ty| event.ev_type == ty))
            .map(|event| event.to_row())
            .collect();

        let quick = (quick_limit.max(0) as usize).min(rows.len());
        let first: Vec<Row> = rows.drain(..quick).collect();
        self.cursors.insert(cursor.to_string(), rows);
        Ok(first)
    }

    fn fetch(&mut self, cursor: &str, count: i64) -> BackendResult<Vec<Row>> {
        let Some(rows) = self.cursors.get_mut(cursor) else {
            return fail(format!("cursor \"{}\" does not exist", cursor));
        };
        let take = (count.max(0) as usize).min(rows.len());
        Ok(rows.drain(..take).collect())
    }

    fn close(&mut self, cursor: &str) -> BackendResult<u64> {
        match self.cursors.remove(cursor) {
            Some(_) => Ok(0),
            None => fail(format!("cursor \"{}\" does not exist", cursor)),
        }
    }

    fn event_retry(&mut self, batch_id: i64, ev_id: i64, due: DateTime<Utc>) -> BackendResult<Value> {
        let events = self.batch_events(batch_id)?;
        let Some(event) = events.into_iter().find(|event| event.ev_id == ev_id) else {
            return fail(format!("event {} not found in batch {}", ev_id, batch_id));
        };
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| BackendError::new(PgqError("batch vanished".to_string())))?;
        if !batch.retried.insert(ev_id) {
            return Ok(Value::Int(0));
        }
        let queue_name = batch.queue.clone();
        let queue = self.queue_mut(&queue_name)?;
        let retried = StoredEvent {
            ev_retry: Some(event.ev_retry.unwrap_or(0) + 1),
            ..event
        };
        queue.retry.push((due, retried));
        Ok(Value::Int(1))
    }

    fn batch_retry(&mut self, batch_id: i64, seconds: i64) -> BackendResult<Value> {
        let due = Utc::now() + ChronoDuration::seconds(seconds);
        let mut count = 0;
        for event in self.batch_events(batch_id)? {
            if self.event_retry(batch_id, event.ev_id, due)? == Value::Int(1) {
                count += 1;
            }
        }
        Ok(Value::Int(count))
    }

    fn finish_batch(&mut self, batch_id: i64) -> BackendResult<Value> {
        let Some(batch) = self.batches.get_mut(&batch_id) else {
            return Ok(Value::Int(0));
        };
        if batch.finished {
            return Ok(Value::Int(0));
        }
        batch.finished = true;
        let (queue_name, consumer, cur_tick) =
            (batch.queue.clone(), batch.consumer.clone(), batch.cur_tick);
        let queue = self.queue_mut(&queue_name)?;
        if let Some(sub) = queue.consumers.get_mut(&consumer) {
            sub.last_tick = cur_tick;
            sub.batch = None;
            sub.last_seen = Utc::now();
        }
        Ok(Value::Int(1))
    }

    fn batch_info(&self, batch_id: i64) -> BackendResult<Vec<Row>> {
        if self.open_batch(batch_id).is_err() {
            return Ok(Vec::new());
        }
        let (batch, prev, cur) = self.batch_ticks(batch_id)?;
        let lag = Utc::now() - cur.time;
        Ok(vec![Row::new()
            .with("queue_name", batch.queue.as_str())
            .with("consumer_name", batch.consumer.as_str())
            .with("batch_start", prev.time)
            .with("batch_end", cur.time)
            .with("prev_tick_id", prev.id)
            .with("tick_id", cur.id)
            .with("lag", Interval::from_secs(lag.num_seconds()))
            .with("seq_start", prev.event_seq)
            .with("seq_end", cur.event_seq)])
    }

    fn consumer_rows(&self, queue: Option<&str>, consumer: Option<&str>) -> BackendResult<Vec<Row>> {
        let now = Utc::now();
        let mut rows = Vec::new();
        for (queue_name, state) in &self.queues {
            if queue.is_some_and(|wanted| wanted != queue_name) {
                continue;
            }
            for (consumer_name, sub) in &state.consumers {
                if consumer.is_some_and(|wanted| wanted != consumer_name) {
                    continue;
                }
                let Some(tick) = state.tick_by_id(sub.last_tick) else {
                    continue;
                };
                let next_tick = sub
                    .batch
                    .and_then(|id| self.batches.get(&id))
                    .map(|batch| batch.cur_tick);
                let pending = state.last_tick().position.saturating_sub(tick.position) as i64;
                rows.push(
                    Row::new()
                        .with("queue_name", queue_name.as_str())
                        .with("consumer_name", consumer_name.as_str())
                        .with("lag", Interval::from_secs((now - tick.time).num_seconds()))
                        .with(
                            "last_seen",
                            Interval::from_secs((now - sub.last_seen).num_seconds()),
                        )
                        .with("last_tick", sub.last_tick)
                        .with("current_batch", sub.batch)
                        .with("next_tick", next_tick)
                        .with("pending_events", pending),
                );
            }
        }
        Ok(rows)
    }

    fn force_tick(&mut self, name: &str) -> BackendResult<Value> {
        let queue = self.queue_mut(name)?;
        let id = queue.last_tick().id + 1;
        Ok(Value::Int(queue.take_tick(id)))
    }

    fn ticker(&mut self, name: &str, external: Option<i64>) -> BackendResult<Value> {
        let queue = self.queue_mut(name)?;
        let last = queue.last_tick().clone();
        match external {
            Some(id) if id <= last.id => fail(format!("tick id {} is not after {}", id, last.id)),
            Some(id) => Ok(Value::Int(queue.take_tick(id))),
            None => {
                let due = queue.events.len() != last.position || queue.has_due_retries(Utc::now());
                if due {
                    Ok(Value::Int(queue.take_tick(last.id + 1)))
                } else {
                    Ok(Value::Null)
                }
            }
        }
    }
}

/// Accepts `ev_type = 'name'`, the only cursor condition the simulation evaluates
fn parse_type_condition(condition: &str) -> BackendResult<String> {
    let value = condition
        .trim()
        .strip_prefix("ev_type")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix('\''))
        .and_then(|rest| rest.strip_suffix('\''));
    match value {
        Some(ty) => Ok(ty.to_string()),
        None => fail(format!("unsupported condition: {}", condition)),
    }
}

fn procedure(sql: &str) -> &str {
    sql.split_once("pgq.")
        .and_then(|(_, rest)| rest.split_once('('))
        .map(|(name, _)| name)
        .unwrap_or("")
}

fn text(params: &[Value], index: usize) -> BackendResult<&str> {
    match params.get(index) {
        Some(Value::Text(s)) => Ok(s),
        other => fail(format!("expected text at ${}, got {:?}", index + 1, other)),
    }
}

fn opt_text(params: &[Value], index: usize) -> BackendResult<Option<String>> {
    match params.get(index) {
        Some(Value::Null) => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.clone())),
        other => fail(format!("expected text or null at ${}, got {:?}", index + 1, other)),
    }
}

fn int(params: &[Value], index: usize) -> BackendResult<i64> {
    match params.get(index) {
        Some(Value::Int(i)) => Ok(*i),
        other => fail(format!("expected integer at ${}, got {:?}", index + 1, other)),
    }
}

fn opt_int(params: &[Value], index: usize) -> BackendResult<Option<i64>> {
    match params.get(index) {
        Some(Value::Null) => Ok(None),
        Some(Value::Int(i)) => Ok(Some(*i)),
        other => fail(format!("expected integer or null at ${}, got {:?}", index + 1, other)),
    }
}

fn flag_param(params: &[Value], index: usize) -> BackendResult<bool> {
    match params.get(index) {
        Some(Value::Bool(b)) => Ok(*b),
        other => fail(format!("expected bool at ${}, got {:?}", index + 1, other)),
    }
}

/// In-memory PgQ engine behind the [`SqlExecutor`] boundary
#[derive(Default)]
pub struct MemoryPgq {
    engine: Mutex<Engine>,
    calls: Mutex<Vec<String>>,
}

impl MemoryPgq {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Statements received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_cursors(&self) -> Vec<String> {
        self.engine.lock().unwrap().cursors.keys().cloned().collect()
    }

    fn rows(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        self.calls.lock().unwrap().push(sql.to_string());
        let mut engine = self.engine.lock().unwrap();
        let engine = &mut *engine;

        if let Some(rest) = sql.strip_prefix("FETCH ") {
            let Some((count, cursor)) = rest.split_once(" FROM ") else {
                return fail(format!("syntax error in: {}", sql));
            };
            let count: i64 = count
                .parse()
                .map_err(|_| BackendError::new(PgqError(format!("bad count in: {}", sql))))?;
            return engine.fetch(cursor, count);
        }

        let single =
            |value: Value| -> BackendResult<Vec<Row>> { Ok(vec![Row::new().with("result", value)]) };
        match (procedure(sql), params.len()) {
            ("create_queue", 1) => single(engine.create_queue(text(params, 0)?)),
            ("drop_queue", 2) => single(engine.drop_queue(text(params, 0)?, flag_param(params, 1)?)?),
            ("set_queue_config", 3) => single(engine.set_queue_config(
                text(params, 0)?,
                text(params, 1)?,
                text(params, 2)?,
            )?),
            ("current_event_table", 1) => {
                let queue = engine.queue(text(params, 0)?)?;
                single(Value::Text(format!("pgq.event_{}_0", queue.id)))
            }
            ("version", 0) => single(Value::Text("3.5.1".to_string())),
            ("get_queue_info", 0) if sql.starts_with("SELECT queue_name") => Ok(engine
                .queues
                .keys()
                .map(|name| Row::new().with("queue_name", name.as_str()))
                .collect()),
            ("get_queue_info", 0) => Ok(engine
                .queues
                .iter()
                .map(|(name, queue)| queue.info_row(name))
                .collect()),
            ("get_queue_info", 1) => {
                let name = text(params, 0)?;
                Ok(engine
                    .queues
                    .get(name)
                    .map(|queue| queue.info_row(name))
                    .into_iter()
                    .collect())
            }
            ("get_consumer_info", 0) => engine.consumer_rows(None, None),
            ("get_consumer_info", 1) => engine.consumer_rows(Some(text(params, 0)?), None),
            ("get_consumer_info", 2) => {
                engine.consumer_rows(Some(text(params, 0)?), Some(text(params, 1)?))
            }
            ("get_batch_info", 1) => engine.batch_info(int(params, 0)?),
            ("insert_event", 3) => single(engine.insert_event(
                text(params, 0)?,
                text(params, 1)?,
                text(params, 2)?,
                Default::default(),
            )?),
            ("insert_event", 7) => {
                let extra = [
                    opt_text(params, 3)?,
                    opt_text(params, 4)?,
                    opt_text(params, 5)?,
                    opt_text(params, 6)?,
                ];
                single(engine.insert_event(
                    text(params, 0)?,
                    text(params, 1)?,
                    text(params, 2)?,
                    extra,
                )?)
            }
            ("register_consumer", 2) => {
                single(engine.register(text(params, 0)?, text(params, 1)?, None)?)
            }
            ("register_consumer_at", 3) => single(engine.register(
                text(params, 0)?,
                text(params, 1)?,
                Some(int(params, 2)?),
            )?),
            ("unregister_consumer", 2) => {
                single(engine.unregister(text(params, 0)?, text(params, 1)?)?)
            }
            ("next_batch", 2) => {
                let batch = engine.claim(text(params, 0)?, text(params, 1)?, None)?;
                single(Value::from(batch))
            }
            ("next_batch_info", 2) => {
                let batch = engine.claim(text(params, 0)?, text(params, 1)?, None)?;
                Ok(vec![engine.next_batch_row(batch)?])
            }
            ("next_batch_custom", 5) => {
                let min_count = opt_int(params, 3)?;
                let batch = engine.claim(text(params, 0)?, text(params, 1)?, min_count)?;
                Ok(vec![engine.next_batch_row(batch)?])
            }
            ("get_batch_events", 1) => Ok(engine
                .batch_events(int(params, 0)?)?
                .iter()
                .map(StoredEvent::to_row)
                .collect()),
            ("get_batch_cursor", 3) => engine.batch_cursor(
                int(params, 0)?,
                text(params, 1)?,
                int(params, 2)?,
                None,
            ),
            ("get_batch_cursor", 4) => engine.batch_cursor(
                int(params, 0)?,
                text(params, 1)?,
                int(params, 2)?,
                Some(text(params, 3)?),
            ),
            ("event_retry", 3) => {
                let due = match params.get(2) {
                    Some(Value::Timestamp(at)) => *at,
                    Some(Value::Int(seconds)) => Utc::now() + ChronoDuration::seconds(*seconds),
                    other => return fail(format!("no event_retry overload for {:?}", other)),
                };
                single(engine.event_retry(int(params, 0)?, int(params, 1)?, due)?)
            }
            ("batch_retry", 2) => single(engine.batch_retry(int(params, 0)?, int(params, 1)?)?),
            ("finish_batch", 1) => single(engine.finish_batch(int(params, 0)?)?),
            ("force_tick", 1) => single(engine.force_tick(text(params, 0)?)?),
            ("ticker", 1) => single(engine.ticker(text(params, 0)?, None)?),
            ("ticker", 2) => single(engine.ticker(text(params, 0)?, Some(int(params, 1)?))?),
            (name, arity) => fail(format!(
                "function pgq.{}({} arguments) does not exist: {}",
                name, arity, sql
            )),
        }
    }
}

#[async_trait]
impl SqlExecutor for MemoryPgq {
    async fn execute(&self, sql: &str, params: &[Value]) -> BackendResult<u64> {
        if let Some(cursor) = sql.strip_prefix("CLOSE ") {
            self.calls.lock().unwrap().push(sql.to_string());
            return self.engine.lock().unwrap().close(cursor);
        }
        self.rows(sql, params).map(|rows| rows.len() as u64)
    }

    async fn select_all(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        self.rows(sql, params)
    }

    async fn select_value(&self, sql: &str, params: &[Value]) -> BackendResult<Value> {
        let rows = self.rows(sql, params)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_values().into_iter().next())
            .unwrap_or(Value::Null))
    }

    async fn select_values(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Value>> {
        let rows = self.rows(sql, params)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_values().into_iter().next())
            .collect())
    }
}

/// Client over a fresh in-memory engine
pub fn memory_client() -> (Arc<MemoryPgq>, PgqClient) {
    let engine = MemoryPgq::new();
    let client = PgqClient::new(engine.clone());
    (engine, client)
}

/// Client with `queue` created and `consumer` registered on it
pub async fn client_with_consumer(queue: &str, consumer: &str) -> (Arc<MemoryPgq>, PgqClient) {
    let (engine, client) = memory_client();
    assert!(client.admin().create_queue(queue).await.unwrap());
    assert!(client.consumer(queue, consumer).register().await.unwrap());
    (engine, client)
}
