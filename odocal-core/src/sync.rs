//! The sync chain: authenticate → partner → attendance → events →
//! per-event alarms → reminder registration.
//!
//! Each stage returns a tagged outcome instead of throwing through the
//! chain, so the "degrade to snapshot" and "skip this alarm" branches
//! are explicit. One chain invocation owns its `Session` outright and
//! is a single cancellable task: the only durable write (the snapshot)
//! happens once, after a fully successful fetch, so dropping the
//! future mid-flight leaves no partial state. Serializing concurrent
//! sync requests is the caller's responsibility.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::alarm::resolve_minutes_before;
use crate::attendance::resolve_attendance;
use crate::auth::authenticate;
use crate::error::OdooResult;
use crate::event::{CalendarEvent, fetch_events};
use crate::identity::{resolve_partner, resolve_timezone};
use crate::rpc::RpcClient;
use crate::schedule::{EventReminders, ScheduledReminder, Scheduler, schedule_reminders};
use crate::session::Session;
use crate::snapshot::SnapshotStore;

/// How a sync pass ended. The empty states are successes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Events fetched from the server (possibly updated snapshot)
    Fetched,
    /// The user has no partner record; no calendar is possible
    NoPartner,
    /// The partner attends nothing
    NoAttendance,
    /// The fetch pass ran and the calendar is empty
    NoEvents,
    /// A downstream stage failed; events were served from the snapshot
    Degraded,
}

/// Result of one sync pass, with diagnostic counts for everything that
/// was silently skipped along the way.
#[derive(Debug)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub events: Vec<CalendarEvent>,
    pub timezone: Tz,
    /// Events with malformed timestamps, kept in `events` but never
    /// scheduled
    pub malformed_events: usize,
    /// Alarm ids dropped for non-integral wire values
    pub dropped_alarm_ids: usize,
}

impl SyncReport {
    fn empty(outcome: SyncOutcome, timezone: Tz) -> Self {
        SyncReport {
            outcome,
            events: Vec::new(),
            timezone,
            malformed_events: 0,
            dropped_alarm_ids: 0,
        }
    }
}

/// Reminder registrations from one scheduling pass.
#[derive(Debug)]
pub struct ScheduleReport {
    pub reminders: Vec<ScheduledReminder>,
    /// Alarm ids whose policy could not be reduced to minutes
    pub indeterminate_alarms: usize,
}

/// Orchestrates the full chain over an injected RPC gateway and a
/// snapshot store.
pub struct CalendarSync<C: RpcClient> {
    client: C,
    snapshot: SnapshotStore,
}

impl<C: RpcClient> CalendarSync<C> {
    pub fn new(client: C, snapshot: SnapshotStore) -> Self {
        CalendarSync { client, snapshot }
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Authenticate the session in place. Failure aborts the chain and
    /// surfaces to the caller; everything downstream degrades instead.
    pub async fn login(&self, session: &mut Session) -> OdooResult<i64> {
        let uid = authenticate(&self.client, session).await?;
        session.uid = Some(uid);
        Ok(uid)
    }

    /// Run the chain once and return the resulting events.
    ///
    /// The snapshot is overwritten only after a fully successful fetch
    /// pass (an empty calendar counts as one); any downstream failure
    /// serves the previous snapshot instead and leaves it untouched.
    pub async fn sync(&self, mut session: Session) -> OdooResult<SyncReport> {
        self.login(&mut session).await?;
        Ok(self.fetch_pass(&session).await)
    }

    /// The full chain including reminder registration, one
    /// authentication round-trip for all of it. Scheduling only runs
    /// on a fresh fetch; cached events carry stale alarm ids.
    pub async fn sync_and_schedule(
        &self,
        mut session: Session,
        scheduler: &dyn Scheduler,
        now: DateTime<Utc>,
    ) -> OdooResult<(SyncReport, ScheduleReport)> {
        self.login(&mut session).await?;
        let report = self.fetch_pass(&session).await;

        let schedule = if report.outcome == SyncOutcome::Fetched {
            self.schedule(&session, scheduler, &report.events, report.timezone, now)
                .await
        } else {
            ScheduleReport {
                reminders: Vec::new(),
                indeterminate_alarms: 0,
            }
        };

        Ok((report, schedule))
    }

    async fn fetch_pass(&self, session: &Session) -> SyncReport {
        let partner_id = match resolve_partner(&self.client, session).await {
            Ok(Some(partner_id)) => partner_id,
            Ok(None) => return SyncReport::empty(SyncOutcome::NoPartner, Tz::UTC),
            Err(err) => {
                warn!(%err, "partner resolution failed, serving snapshot");
                return self.degraded(Tz::UTC);
            }
        };

        let timezone = resolve_timezone(&self.client, session).await;

        let attendee_ids = match resolve_attendance(&self.client, session, partner_id).await {
            Ok(ids) if ids.is_empty() => {
                return SyncReport::empty(SyncOutcome::NoAttendance, timezone);
            }
            Ok(ids) => ids,
            Err(err) => {
                warn!(%err, "attendance resolution failed, serving snapshot");
                return self.degraded(timezone);
            }
        };

        let fetched = fetch_events(&self.client, session, &attendee_ids, timezone).await;
        if !fetched.complete {
            return self.degraded(timezone);
        }

        if let Err(err) = self.snapshot.save(&fetched.events) {
            // Not fatal: the fetch itself succeeded, only the cache is
            // stale now.
            warn!(%err, "could not persist snapshot");
        }

        let outcome = if fetched.events.is_empty() {
            SyncOutcome::NoEvents
        } else {
            SyncOutcome::Fetched
        };
        info!(count = fetched.events.len(), ?outcome, "sync pass finished");

        SyncReport {
            outcome,
            events: fetched.events,
            timezone,
            malformed_events: fetched.malformed_events,
            dropped_alarm_ids: fetched.dropped_alarm_ids,
        }
    }

    /// End-to-end event load with connectivity probed by the caller:
    /// offline goes straight to the snapshot and issues no remote
    /// calls.
    pub async fn load_calendar_events(
        &self,
        session: Session,
        online: bool,
    ) -> OdooResult<SyncReport> {
        if !online {
            info!("offline, serving snapshot");
            return Ok(self.degraded(Tz::UTC));
        }
        self.sync(session).await
    }

    /// Resolve each event's alarm policies and register reminders.
    ///
    /// Resolution failures are isolated per alarm id; an event whose
    /// alarms are all indeterminate simply gets no reminder. Events
    /// are registered in reverse fetch order.
    pub async fn schedule(
        &self,
        session: &Session,
        scheduler: &dyn Scheduler,
        events: &[CalendarEvent],
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> ScheduleReport {
        let mut indeterminate = 0;
        let mut entries = Vec::with_capacity(events.len());

        for event in events {
            let mut minutes_before = Vec::with_capacity(event.alarm_ids.len());
            for &alarm_id in &event.alarm_ids {
                match resolve_minutes_before(&self.client, session, alarm_id).await {
                    Some(minutes) => minutes_before.push(minutes),
                    None => indeterminate += 1,
                }
            }
            entries.push(EventReminders {
                event,
                minutes_before,
            });
        }

        let reminders = schedule_reminders(scheduler, &entries, timezone, now);
        ScheduleReport {
            reminders,
            indeterminate_alarms: indeterminate,
        }
    }

    fn degraded(&self, timezone: Tz) -> SyncReport {
        let events = self.snapshot.load();
        SyncReport {
            outcome: SyncOutcome::Degraded,
            events,
            timezone,
            malformed_events: 0,
            dropped_alarm_ids: 0,
        }
    }
}
