//! Reminder scheduling against the platform alarm service.
//!
//! The OS primitive that actually wakes up and delivers is out of
//! scope; it sits behind the [`Scheduler`] trait. This module turns
//! (event, minutes-before) pairs into absolute trigger instants and
//! negotiates exact vs inexact delivery.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::event::CalendarEvent;

/// Whether the platform guaranteed precise wake timing for a
/// registration, or only a best-effort delivery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Exact,
    Inexact,
}

/// Result of attempting an exact registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    /// The platform refused the exact-scheduling capability.
    Denied,
}

/// A reminder handed to the platform scheduler. Transient: re-derived
/// on every sync, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledReminder {
    pub event_id: i64,
    pub trigger_at: DateTime<Tz>,
    pub precision: Precision,
}

/// External alarm service. The key is the event id: registering the
/// same key again replaces the pending trigger, it never duplicates.
pub trait Scheduler {
    fn register_exact(&self, key: i64, at: DateTime<Tz>) -> RegisterOutcome;
    fn register_inexact(&self, key: i64, at: DateTime<Tz>);
    /// Ask the platform to grant exact scheduling for future passes.
    fn request_exact_capability(&self);
}

/// One fetched event with its resolved minutes-before offsets.
/// Indeterminate alarms have already been dropped by the resolver.
#[derive(Debug)]
pub struct EventReminders<'a> {
    pub event: &'a CalendarEvent,
    pub minutes_before: Vec<i64>,
}

/// Register reminders for every resolved (event, minutes) pair.
///
/// Events are processed in reverse of their fetch order; since the
/// registration key is the event id and the scheduler replaces on
/// re-registration, this ordering decides which trigger wins when an
/// event carries several alarms. Triggers not strictly in the future
/// are skipped. One event's failure never blocks its siblings.
pub fn schedule_reminders(
    scheduler: &dyn Scheduler,
    events: &[EventReminders<'_>],
    tz: Tz,
    now: DateTime<Utc>,
) -> Vec<ScheduledReminder> {
    let mut registered = Vec::new();

    for entry in events.iter().rev() {
        let event = entry.event;
        if entry.minutes_before.is_empty() {
            debug!(event_id = event.id, "event has no resolvable alarms");
            continue;
        }
        let Some(start) = event.scheduling_start() else {
            warn!(event_id = event.id, "event has no usable start, not scheduling");
            continue;
        };

        for &minutes in &entry.minutes_before {
            let Some(trigger_at) = trigger_instant(start, minutes, tz) else {
                warn!(
                    event_id = event.id,
                    "trigger falls in a nonexistent local time, skipping"
                );
                continue;
            };

            if trigger_at.with_timezone(&Utc) <= now {
                debug!(
                    event_id = event.id,
                    trigger = %trigger_at,
                    "trigger is not in the future, skipping"
                );
                continue;
            }

            let precision = match scheduler.register_exact(event.id, trigger_at) {
                RegisterOutcome::Registered => Precision::Exact,
                RegisterOutcome::Denied => {
                    scheduler.request_exact_capability();
                    scheduler.register_inexact(event.id, trigger_at);
                    Precision::Inexact
                }
            };

            debug!(
                event_id = event.id,
                trigger = %trigger_at,
                ?precision,
                "reminder registered"
            );
            registered.push(ScheduledReminder {
                event_id: event.id,
                trigger_at,
                precision,
            });
        }
    }

    registered
}

/// Absolute trigger instant: event start minus the offset, resolved in
/// the user's zone. An ambiguous local time (DST fold) takes the
/// earlier mapping; a nonexistent one (DST gap) yields nothing.
fn trigger_instant(start: NaiveDateTime, minutes_before: i64, tz: Tz) -> Option<DateTime<Tz>> {
    let local = start - Duration::minutes(minutes_before);
    match tz.from_local_datetime(&local) {
        LocalResult::Single(at) => Some(at),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}
