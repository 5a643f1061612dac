//! Alarm policies and their reduction to minutes-before-start.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::rpc::RpcClient;
use crate::session::Session;

/// Interval unit of an alarm policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmUnit {
    Minutes,
    Hours,
    Days,
}

impl AlarmUnit {
    /// Parse the wire string. Anything unrecognized is indeterminate,
    /// never guessed.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "minutes" => Some(AlarmUnit::Minutes),
            "hours" => Some(AlarmUnit::Hours),
            "days" => Some(AlarmUnit::Days),
            _ => None,
        }
    }

    pub fn to_minutes(self) -> i64 {
        match self {
            AlarmUnit::Minutes => 1,
            AlarmUnit::Hours => 60,
            AlarmUnit::Days => 1440,
        }
    }
}

/// A server-defined reminder rule attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmPolicy {
    pub id: i64,
    pub duration: i64,
    pub unit: AlarmUnit,
}

impl AlarmPolicy {
    pub fn minutes_before(&self) -> i64 {
        self.duration * self.unit.to_minutes()
    }
}

/// Fetch one alarm policy and reduce it to minutes before event start.
///
/// Every failure mode (missing result, empty set, null duration,
/// unrecognized unit, transport error) yields `None` and its own log
/// line; none of them may fail the chain. One attempt per alarm id.
pub async fn resolve_minutes_before(
    client: &dyn RpcClient,
    session: &Session,
    alarm_id: i64,
) -> Option<i64> {
    let Ok((_, mut args)) = session.execute_kw_prefix() else {
        warn!(alarm_id, "alarm lookup on unauthenticated session");
        return None;
    };
    args.extend([
        json!("calendar.alarm"),
        json!("read"),
        json!([alarm_id]),
        json!({ "fields": ["duration", "interval"] }),
    ]);

    let result = match client
        .call(&session.endpoint, "object", "execute_kw", args)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            warn!(alarm_id, %err, "alarm lookup failed");
            return None;
        }
    };

    let Some(row) = result.as_array().and_then(|rows| rows.first()) else {
        warn!(alarm_id, "alarm lookup returned no record");
        return None;
    };

    let Some(duration) = row.get("duration").and_then(numeric_duration) else {
        warn!(alarm_id, "alarm record has no usable duration");
        return None;
    };

    let Some(unit) = row
        .get("interval")
        .and_then(Value::as_str)
        .and_then(AlarmUnit::from_wire)
    else {
        warn!(alarm_id, interval = ?row.get("interval"), "unrecognized alarm interval");
        return None;
    };

    let policy = AlarmPolicy {
        id: alarm_id,
        duration,
        unit,
    };
    let minutes = policy.minutes_before();
    debug!(alarm_id, minutes, "resolved alarm policy");
    Some(minutes)
}

/// Odoo sends `duration` as a number, sometimes float-encoded.
fn numeric_duration(value: &Value) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    let float = value.as_f64()?;
    (float.fract() == 0.0).then_some(float as i64)
}
