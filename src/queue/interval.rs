//! PostgreSQL interval values
//!
//! Batch thresholds and queue settings are expressed as intervals. This
//! module renders durations as literals the backend accepts through an
//! `::interval` cast, and parses the forms users type on the command line:
//! clock style (`"05:25:30"`) and unit phrases (`"5 hours 25 minutes 30
//! seconds"`, `"1 day 2h"`).

use crate::core::validation::ValidationError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// Interval with the same three components PostgreSQL stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
        }
    }

    pub fn from_secs(seconds: i64) -> Self {
        Self::new(0, 0, seconds * MICROS_PER_SECOND)
    }

    pub fn from_hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::new(
            0,
            0,
            hours * MICROS_PER_HOUR + minutes * MICROS_PER_MINUTE + seconds * MICROS_PER_SECOND,
        )
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.microseconds == 0
    }

    /// Convert to a std duration assuming 30-day months and 24-hour days
    ///
    /// Returns `None` for negative intervals.
    pub fn to_std(&self) -> Option<Duration> {
        let days = i64::from(self.months) * 30 + i64::from(self.days);
        let micros = days
            .checked_mul(24 * MICROS_PER_HOUR)?
            .checked_add(self.microseconds)?;
        u64::try_from(micros).ok().map(Duration::from_micros)
    }
}

impl From<Duration> for Interval {
    fn from(duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Self::new(0, 0, micros)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if self.months != 0 {
            let unit = if self.months.abs() == 1 { "mon" } else { "mons" };
            parts.push(format!("{} {}", self.months, unit));
        }
        if self.days != 0 {
            let unit = if self.days.abs() == 1 { "day" } else { "days" };
            parts.push(format!("{} {}", self.days, unit));
        }
        if self.microseconds != 0 || parts.is_empty() {
            let sign = if self.microseconds < 0 { "-" } else { "" };
            let total = self.microseconds.unsigned_abs();
            let micros_per_second = MICROS_PER_SECOND as u64;
            let hours = total / MICROS_PER_HOUR as u64;
            let minutes = (total % MICROS_PER_HOUR as u64) / MICROS_PER_MINUTE as u64;
            let seconds = (total % MICROS_PER_MINUTE as u64) / micros_per_second;
            let fraction = total % micros_per_second;

            let mut clock = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
            if fraction != 0 {
                clock.push_str(&format!(".{:06}", fraction));
            }
            parts.push(clock);
        }

        write!(f, "{}", parts.join(" "))
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let lower = input.trim().to_lowercase();
        if lower.is_empty() {
            return Err(ValidationError::new("Interval cannot be empty"));
        }

        let mut interval = Interval::default();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        let mut index = 0;

        while index < tokens.len() {
            let token = tokens[index];

            if token.contains(':') {
                let micros = parse_clock(token)?;
                interval.microseconds = interval
                    .microseconds
                    .checked_add(micros)
                    .ok_or_else(|| out_of_range(input))?;
                index += 1;
                continue;
            }

            // Accept both "5 hours" and "5hours"/"5h"
            let split_at = token
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
                .unwrap_or(token.len());
            let (number, attached_unit) = token.split_at(split_at);
            let unit = if attached_unit.is_empty() {
                index += 1;
                tokens.get(index).copied().ok_or_else(|| {
                    ValidationError::new(&format!(
                        "Invalid interval '{}': missing unit after '{}'",
                        input, number
                    ))
                })?
            } else {
                attached_unit
            };
            index += 1;

            let amount: f64 = number.parse().map_err(|_| {
                ValidationError::new(&format!(
                    "Invalid interval '{}': '{}' is not a number",
                    input, number
                ))
            })?;
            apply_unit(&mut interval, amount, unit, input)?;
        }

        Ok(interval)
    }
}

fn parse_clock(token: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::new(&format!("Invalid clock interval '{}'", token));

    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let fields: Vec<&str> = body.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(invalid());
    }

    let hours: i64 = fields[0].parse().map_err(|_| invalid())?;
    let minutes: i64 = fields[1].parse().map_err(|_| invalid())?;
    let seconds: f64 = match fields.get(2) {
        Some(s) => s.parse().map_err(|_| invalid())?,
        None => 0.0,
    };
    if !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }

    let micros = hours
        .checked_mul(MICROS_PER_HOUR)
        .and_then(|micros| micros.checked_add(minutes * MICROS_PER_MINUTE))
        .and_then(|micros| micros.checked_add((seconds * MICROS_PER_SECOND as f64).round() as i64))
        .ok_or_else(|| out_of_range(token))?;
    Ok(if negative { -micros } else { micros })
}

fn out_of_range(input: &str) -> ValidationError {
    ValidationError::new(&format!("Invalid interval '{}': out of range", input))
}

/// Convert a scaled amount to whole microseconds, rejecting values past `i64`
fn scaled_micros(amount: f64, scale: f64, input: &str) -> Result<i64, ValidationError> {
    let micros = (amount * scale).round();
    if !micros.is_finite() || micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return Err(out_of_range(input));
    }
    Ok(micros as i64)
}

fn apply_unit(
    interval: &mut Interval,
    amount: f64,
    unit: &str,
    input: &str,
) -> Result<(), ValidationError> {
    let whole = |amount: f64| -> Result<i32, ValidationError> {
        if amount.fract() != 0.0 {
            return Err(ValidationError::new(&format!(
                "Invalid interval '{}': '{}' must be a whole number of {}",
                input, amount, unit
            )));
        }
        if amount < i32::MIN as f64 || amount > i32::MAX as f64 {
            return Err(out_of_range(input));
        }
        Ok(amount as i32)
    };
    let add_micros = |interval: &mut Interval, scale: f64| -> Result<(), ValidationError> {
        interval.microseconds = interval
            .microseconds
            .checked_add(scaled_micros(amount, scale, input)?)
            .ok_or_else(|| out_of_range(input))?;
        Ok(())
    };
    let add_days = |interval: &mut Interval, days: Option<i32>| -> Result<(), ValidationError> {
        interval.days = days
            .and_then(|days| interval.days.checked_add(days))
            .ok_or_else(|| out_of_range(input))?;
        Ok(())
    };
    let add_months = |interval: &mut Interval, months: Option<i32>| -> Result<(), ValidationError> {
        interval.months = months
            .and_then(|months| interval.months.checked_add(months))
            .ok_or_else(|| out_of_range(input))?;
        Ok(())
    };

    match unit.trim_end_matches(',') {
        "us" | "usec" | "usecs" | "microsecond" | "microseconds" => add_micros(interval, 1.0)?,
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            add_micros(interval, 1_000.0)?
        }
        "s" | "sec" | "secs" | "second" | "seconds" => {
            add_micros(interval, MICROS_PER_SECOND as f64)?
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            add_micros(interval, MICROS_PER_MINUTE as f64)?
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => add_micros(interval, MICROS_PER_HOUR as f64)?,
        "d" | "day" | "days" => add_days(interval, Some(whole(amount)?))?,
        "w" | "week" | "weeks" => add_days(interval, whole(amount)?.checked_mul(7))?,
        "mon" | "mons" | "month" | "months" => add_months(interval, Some(whole(amount)?))?,
        "y" | "yr" | "yrs" | "year" | "years" => {
            add_months(interval, whole(amount)?.checked_mul(12))?
        }
        other => {
            return Err(ValidationError::new(&format!(
                "Invalid interval '{}': unknown unit '{}'",
                input, other
            )))
        }
    }
    Ok(())
}
