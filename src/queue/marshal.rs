//! Marshaling between domain values and remote procedure arguments/results
//!
//! Argument side: extra-field padding, the compact/full insert call shape.
//! Result side: typed decoding of scalar values and named row columns, and
//! normalisation of the integer success flags several procedures return.

use crate::core::validation::ValidationError;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::executor::{Row, Value};
use crate::queue::interval::Interval;
use crate::queue::sql;
use chrono::{DateTime, Utc};

/// Number of optional extra text fields an event carries
pub const EXTRA_FIELD_COUNT: usize = 4;

/// Typed extraction from a single [`Value`]
pub trait FromValue: Sized {
    /// Label used in decode errors
    const EXPECTED: &'static str;

    fn from_value(field: &str, value: &Value) -> QueueResult<Self>;
}

fn mismatch<T: FromValue>(field: &str, value: &Value) -> QueueError {
    QueueError::decode(field, T::EXPECTED, value.type_name())
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "32-bit integer";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Int(i) => i32::try_from(*i)
                .map_err(|_| QueueError::decode(field, Self::EXPECTED, i.to_string())),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: &'static str = "timestamp";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl FromValue for Interval {
    const EXPECTED: &'static str = "interval";

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Interval(i) => Ok(*i),
            // Some executors hand intervals back in their text form
            Value::Text(s) => s
                .parse()
                .map_err(|_| QueueError::decode(field, Self::EXPECTED, s.clone())),
            other => Err(mismatch::<Self>(field, other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(field: &str, value: &Value) -> QueueResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(field, other).map(Some),
        }
    }
}

/// Decoding of a whole result row into a record with a fixed field set
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> QueueResult<Self>;
}

/// Read a named column; a missing column is a decode error even for
/// nullable fields, because every record's field set is fixed.
pub fn column<T: FromValue>(row: &Row, name: &str) -> QueueResult<T> {
    let value = row
        .get(name)
        .ok_or_else(|| QueueError::decode(name, T::EXPECTED, "missing column"))?;
    T::from_value(name, value)
}

/// Decode the scalar result of a remote procedure
pub fn scalar<T: FromValue>(procedure: &str, value: &Value) -> QueueResult<T> {
    T::from_value(procedure, value)
}

/// Normalise a success flag returned by a remote procedure
///
/// `1` and `true` mean success. Any other integer, `false` and NULL mean
/// "not done" (already registered, batch not found, ...). Other value types
/// are a decode error.
pub fn flag(procedure: &str, value: &Value) -> QueueResult<bool> {
    match value {
        Value::Int(i) => Ok(*i == 1),
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(QueueError::decode(procedure, "0/1 flag", other.type_name())),
    }
}

/// Pad extra fields to exactly [`EXTRA_FIELD_COUNT`] slots
pub fn pad_extra(
    extra: &[Option<String>],
) -> Result<[Option<String>; EXTRA_FIELD_COUNT], ValidationError> {
    if extra.len() > EXTRA_FIELD_COUNT {
        return Err(ValidationError::new(&format!(
            "extra array should have size {} or less, got {}",
            EXTRA_FIELD_COUNT,
            extra.len()
        )));
    }

    let mut padded: [Option<String>; EXTRA_FIELD_COUNT] = Default::default();
    for (slot, value) in padded.iter_mut().zip(extra) {
        *slot = value.clone();
    }
    Ok(padded)
}

/// The two shapes of `pgq.insert_event`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertShape {
    /// Type and data only
    Compact,
    /// Type, data and all four extra fields
    Full([Option<String>; EXTRA_FIELD_COUNT]),
}

impl InsertShape {
    /// Choose the call shape solely on whether extras were supplied
    pub fn resolve(extra: Option<&[Option<String>]>) -> Result<Self, ValidationError> {
        match extra {
            None => Ok(Self::Compact),
            Some(fields) => pad_extra(fields).map(Self::Full),
        }
    }

    pub fn statement(&self) -> &'static str {
        match self {
            Self::Compact => sql::INSERT_EVENT,
            Self::Full(_) => sql::INSERT_EVENT_EXTRA,
        }
    }

    pub fn params(&self, queue_name: &str, ev_type: &str, ev_data: &str) -> Vec<Value> {
        let mut params = vec![
            Value::from(queue_name),
            Value::from(ev_type),
            Value::from(ev_data),
        ];
        if let Self::Full(extra) = self {
            params.extend(extra.iter().cloned().map(Value::from));
        }
        params
    }
}
