//! Calendar events and the remote fetch that produces them.

use std::fmt;

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::rpc::RpcClient;
use crate::session::Session;

/// Wire format Odoo stores datetimes in, always UTC.
pub const ODOO_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One bound of an event's interval.
///
/// The server occasionally delivers a string that is no datetime at
/// all. Such bounds are carried verbatim so the event still shows up
/// in listings and the snapshot; only scheduling refuses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// Parsed and converted to wall-clock time in the user's zone
    Local(NaiveDateTime),
    /// The wire string, kept as-is because it failed to parse
    Raw(String),
}

impl EventTime {
    pub fn local(&self) -> Option<NaiveDateTime> {
        match self {
            EventTime::Local(at) => Some(*at),
            EventTime::Raw(_) => None,
        }
    }
}

impl From<NaiveDateTime> for EventTime {
    fn from(at: NaiveDateTime) -> Self {
        EventTime::Local(at)
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Local(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M")),
            EventTime::Raw(raw) => f.write_str(raw),
        }
    }
}

/// A calendar event, with start/stop as wall-clock time in the user's
/// resolved timezone.
///
/// Constructed fresh on every successful fetch pass and superseded
/// (never mutated) by the next one; the snapshot store owns the last
/// durable copy. Invariant: `start <= stop` unless `allday`; an event
/// violating it is still listed and cached but never scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Server-assigned, stable, unique
    pub id: i64,
    pub name: String,
    pub start: EventTime,
    pub stop: EventTime,
    pub allday: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Alarm policy ids in server order (possibly empty)
    #[serde(rename = "alarmIds")]
    pub alarm_ids: Vec<i64>,
}

impl CalendarEvent {
    /// Start instant usable for reminder scheduling.
    ///
    /// `None` when either bound failed to parse, or when a non-allday
    /// interval is inverted. The event itself stays visible and
    /// cached; it just never produces a reminder.
    pub fn scheduling_start(&self) -> Option<NaiveDateTime> {
        let start = self.start.local()?;
        let stop = self.stop.local()?;
        if !self.allday && start > stop {
            return None;
        }
        Some(start)
    }
}

/// Result of one fetch pass. Counters record what was silently
/// dropped, for the diagnostic summary; the drops themselves are
/// log-only.
#[derive(Debug, Default)]
pub struct FetchedEvents {
    pub events: Vec<CalendarEvent>,
    /// True when the remote call itself succeeded. A degraded (failed)
    /// pass also yields an empty `events`, but must never be persisted
    /// as if the calendar were empty.
    pub complete: bool,
    /// Events kept for display and the snapshot but excluded from
    /// scheduling (unparseable or inverted start/stop), plus rows too
    /// broken to represent at all
    pub malformed_events: usize,
    /// Alarm ids dropped because the wire value was not integral
    pub dropped_alarm_ids: usize,
}

/// Fetch the events whose attendance intersects `attendee_ids`,
/// normalized to `tz`.
///
/// One `search_read`, server-ordered by `start asc`; the order is
/// authoritative and preserved. Any transport or decode failure of
/// the call itself degrades to an empty result so the caller can fall
/// back to the snapshot.
pub async fn fetch_events(
    client: &dyn RpcClient,
    session: &Session,
    attendee_ids: &[i64],
    tz: Tz,
) -> FetchedEvents {
    let Ok((_, mut args)) = session.execute_kw_prefix() else {
        warn!("event fetch on unauthenticated session");
        return FetchedEvents::default();
    };
    args.extend([
        json!("calendar.event"),
        json!("search_read"),
        json!([[["attendee_ids", "in", attendee_ids]]]),
        json!({
            "fields": [
                "name", "start", "stop", "allday",
                "description", "location", "attendee_ids", "alarm_ids"
            ],
            "order": "start asc"
        }),
    ]);

    let result = match client
        .call(&session.endpoint, "object", "execute_kw", args)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            warn!(%err, "event fetch failed, caller should use the snapshot");
            return FetchedEvents::default();
        }
    };

    let Some(rows) = result.as_array() else {
        warn!("event fetch returned a non-list result");
        return FetchedEvents::default();
    };

    let mut fetched = FetchedEvents {
        complete: true,
        ..FetchedEvents::default()
    };
    for row in rows {
        match parse_event(row, tz, &mut fetched.malformed_events, &mut fetched.dropped_alarm_ids)
        {
            Some(event) => fetched.events.push(event),
            None => fetched.malformed_events += 1,
        }
    }

    debug!(
        count = fetched.events.len(),
        malformed = fetched.malformed_events,
        "fetched calendar events"
    );
    fetched
}

fn parse_event(
    row: &Value,
    tz: Tz,
    malformed: &mut usize,
    dropped_alarm_ids: &mut usize,
) -> Option<CalendarEvent> {
    let id = row.get("id")?.as_i64()?;
    let name = row.get("name")?.as_str()?.to_string();

    let event = CalendarEvent {
        id,
        name,
        start: parse_utc_to_local(row.get("start")?.as_str()?, tz),
        stop: parse_utc_to_local(row.get("stop")?.as_str()?, tz),
        allday: row.get("allday").and_then(Value::as_bool).unwrap_or(false),
        description: optional_text(row.get("description")),
        location: optional_text(row.get("location")),
        alarm_ids: integral_ids(row.get("alarm_ids"), dropped_alarm_ids),
    };

    if event.scheduling_start().is_none() {
        warn!(
            id,
            "event has unusable start/stop, kept for display but never scheduled"
        );
        *malformed += 1;
    }

    Some(event)
}

/// Parse an Odoo UTC datetime string and convert it to wall-clock time
/// in `tz`, calendar-correctly (DST-aware, not fixed-offset). A string
/// that fails to parse is carried raw.
fn parse_utc_to_local(raw: &str, tz: Tz) -> EventTime {
    match NaiveDateTime::parse_from_str(raw, ODOO_DATETIME_FORMAT) {
        Ok(naive) => {
            let utc = Utc.from_utc_datetime(&naive);
            EventTime::Local(utc.with_timezone(&tz).naive_local())
        }
        Err(_) => EventTime::Raw(raw.to_string()),
    }
}

/// Odoo encodes absent text fields as boolean `false`.
fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Alarm ids may arrive float-encoded. Keep exactly-integral values,
/// drop the rest silently (logged) and count them.
fn integral_ids(value: Option<&Value>, dropped: &mut usize) -> Vec<i64> {
    let Some(raw) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut ids = Vec::with_capacity(raw.len());
    for item in raw {
        if let Some(id) = item.as_i64() {
            ids.push(id);
        } else if let Some(float) = item.as_f64() {
            if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                ids.push(float as i64);
            } else {
                warn!(value = float, "dropping non-integral alarm id");
                *dropped += 1;
            }
        } else {
            warn!(?item, "dropping non-numeric alarm id");
            *dropped += 1;
        }
    }
    ids
}
