//! End-to-end chain tests against a scripted RPC gateway.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};

use odocal_core::rpc::testing::{OfflineRpc, ScriptedRpc};
use odocal_core::schedule::{RegisterOutcome, Scheduler};
use odocal_core::snapshot::SnapshotStore;
use odocal_core::sync::{CalendarSync, SyncOutcome};
use odocal_core::{CalendarEvent, OdooError, Session};

fn session() -> Session {
    Session::new("https://erp.example.com", "prod", "alice", "secret")
}

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn event_row(id: i64, name: &str, start: &str, stop: &str, alarm_ids: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "start": start,
        "stop": stop,
        "allday": false,
        "description": false,
        "location": false,
        "alarm_ids": alarm_ids
    })
}

fn cached_event(id: i64) -> CalendarEvent {
    CalendarEvent {
        id,
        name: format!("Cached {id}"),
        start: local(2024, 6, 10, 9, 0).into(),
        stop: local(2024, 6, 10, 10, 0).into(),
        allday: false,
        description: None,
        location: None,
        alarm_ids: vec![],
    }
}

/// Records registration keys; grants every exact request.
#[derive(Default)]
struct RecordingScheduler {
    keys: Mutex<Vec<i64>>,
}

impl Scheduler for RecordingScheduler {
    fn register_exact(&self, key: i64, _at: DateTime<Tz>) -> RegisterOutcome {
        self.keys.lock().unwrap().push(key);
        RegisterOutcome::Registered
    }

    fn register_inexact(&self, key: i64, _at: DateTime<Tz>) {
        self.keys.lock().unwrap().push(key);
    }

    fn request_exact_capability(&self) {}
}

#[tokio::test]
async fn full_chain_fetches_normalizes_and_persists() {
    let rpc = ScriptedRpc::new(vec![
        // authenticate
        Ok(json!(7)),
        // res.users read partner_id
        Ok(json!([{ "id": 7, "partner_id": [42, "Alice Doe"] }])),
        // res.users read tz
        Ok(json!([{ "id": 7, "tz": "America/Bogota" }])),
        // calendar.attendee search
        Ok(json!([11, 12])),
        // calendar.event search_read (start asc), times in UTC
        Ok(json!([
            event_row(1, "Standup", "2024-06-10 14:00:00", "2024-06-10 14:30:00", json!([3])),
            event_row(2, "Review", "2024-06-10 19:00:00", "2024-06-10 20:00:00", json!([])),
        ])),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("events.json"));
    let chain = CalendarSync::new(rpc, store);

    let report = chain.sync(session()).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::Fetched);
    assert_eq!(report.timezone, chrono_tz::America::Bogota);
    // 14:00 UTC is 09:00 in Bogota
    assert_eq!(report.events[0].start, local(2024, 6, 10, 9, 0).into());
    assert_eq!(report.events[1].start, local(2024, 6, 10, 14, 0).into());

    // Snapshot now holds exactly the fetched pass
    assert_eq!(chain.snapshot().load(), report.events);
}

#[tokio::test]
async fn chain_issues_calls_in_dependency_order() {
    let rpc = ScriptedRpc::new(vec![
        Ok(json!(7)),
        Ok(json!([{ "id": 7, "partner_id": [42, "Alice"] }])),
        Ok(json!([{ "id": 7, "tz": "UTC" }])),
        Ok(json!([11])),
        Ok(json!([])),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let chain = CalendarSync::new(rpc, SnapshotStore::new(dir.path().join("e.json")));

    let report = chain.sync(session()).await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::NoEvents);

    let calls = chain.client().calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0].service, "common");
    assert_eq!(calls[0].method, "authenticate");
    for call in &calls[1..] {
        assert_eq!(call.service, "object");
        assert_eq!(call.method, "execute_kw");
    }
    // Attendance search carries the partner id, the event search the
    // attendee ids it produced.
    assert_eq!(calls[3].args[5], json!([[["partner_id", "=", 42]]]));
    assert_eq!(calls[4].args[5], json!([[["attendee_ids", "in", [11]]]]));
}

#[tokio::test]
async fn offline_serves_snapshot_with_zero_remote_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("events.json"));
    let saved = vec![cached_event(1), cached_event(2), cached_event(3)];
    store.save(&saved).unwrap();

    let rpc = ScriptedRpc::new(vec![]);
    let chain = CalendarSync::new(rpc, store);

    let report = chain
        .load_calendar_events(session(), false)
        .await
        .unwrap();

    assert_eq!(report.outcome, SyncOutcome::Degraded);
    assert_eq!(report.events, saved);
    assert_eq!(chain.client().call_count(), 0);
}

#[tokio::test]
async fn downstream_transport_failure_degrades_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("events.json"));
    let saved = vec![cached_event(9)];
    store.save(&saved).unwrap();

    let rpc = ScriptedRpc::new(vec![
        Ok(json!(7)),
        // partner lookup dies on the wire
        Err(OdooError::Unreachable("connection reset".into())),
    ]);
    let chain = CalendarSync::new(rpc, store);

    let report = chain.sync(session()).await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Degraded);
    assert_eq!(report.events, saved);
    // The failed pass must not have touched the snapshot
    assert_eq!(chain.snapshot().load(), saved);
}

#[tokio::test]
async fn auth_failure_aborts_and_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let chain = CalendarSync::new(
        ScriptedRpc::new(vec![Ok(Value::Null)]),
        SnapshotStore::new(dir.path().join("e.json")),
    );
    let err = chain.sync(session()).await.unwrap_err();
    assert!(matches!(err, OdooError::InvalidCredentials));
    assert_eq!(chain.client().call_count(), 1);
}

#[tokio::test]
async fn auth_transport_failure_surfaces_distinctly() {
    let dir = tempfile::tempdir().unwrap();
    let chain = CalendarSync::new(
        OfflineRpc,
        SnapshotStore::new(dir.path().join("e.json")),
    );
    let err = chain.sync(session()).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn no_partner_is_terminal_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("events.json"));
    store.save(&[cached_event(1)]).unwrap();

    let rpc = ScriptedRpc::new(vec![
        Ok(json!(7)),
        Ok(json!([{ "id": 7, "partner_id": false }])),
    ]);
    let chain = CalendarSync::new(rpc, store);

    let report = chain.sync(session()).await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::NoPartner);
    assert!(report.events.is_empty());
    // Terminal state, not a successful fetch pass: snapshot untouched
    assert_eq!(chain.snapshot().load().len(), 1);
}

#[tokio::test]
async fn partial_alarm_failure_yields_one_reminder_and_spares_siblings() {
    // Event 1 has two alarms: id 3 resolves to 30 minutes, id 4 is
    // indeterminate (unknown unit). Event 2 has one good alarm.
    let rpc = ScriptedRpc::new(vec![
        Ok(json!(7)),
        Ok(json!([{ "id": 7, "partner_id": [42, "Alice"] }])),
        Ok(json!([{ "id": 7, "tz": "UTC" }])),
        Ok(json!([11])),
        Ok(json!([
            event_row(1, "Planning", "2030-06-10 09:00:00", "2030-06-10 10:00:00", json!([3, 4])),
            event_row(2, "Retro", "2030-06-11 09:00:00", "2030-06-11 10:00:00", json!([5])),
        ])),
        // alarm 3
        Ok(json!([{ "id": 3, "duration": 30, "interval": "minutes" }])),
        // alarm 4: unrecognized unit
        Ok(json!([{ "id": 4, "duration": 2, "interval": "weeks" }])),
        // alarm 5
        Ok(json!([{ "id": 5, "duration": 1, "interval": "hours" }])),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let chain = CalendarSync::new(rpc, SnapshotStore::new(dir.path().join("e.json")));

    let scheduler = RecordingScheduler::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (report, schedule) = chain
        .sync_and_schedule(session(), &scheduler, now)
        .await
        .unwrap();
    assert_eq!(report.outcome, SyncOutcome::Fetched);

    assert_eq!(schedule.indeterminate_alarms, 1);
    let event1: Vec<_> = schedule
        .reminders
        .iter()
        .filter(|r| r.event_id == 1)
        .collect();
    assert_eq!(event1.len(), 1);
    assert_eq!(event1[0].trigger_at.naive_local(), local(2030, 6, 10, 8, 30));

    // Reverse fetch order: event 2 registered before event 1
    assert_eq!(*scheduler.keys.lock().unwrap(), vec![2, 1]);
}

#[tokio::test]
async fn malformed_event_is_listed_and_cached_but_never_scheduled() {
    let rpc = ScriptedRpc::new(vec![
        Ok(json!(7)),
        Ok(json!([{ "id": 7, "partner_id": [42, "Alice"] }])),
        Ok(json!([{ "id": 7, "tz": "UTC" }])),
        Ok(json!([11])),
        Ok(json!([
            event_row(1, "Broken", "not a date", "2030-06-10 15:00:00", json!([3])),
            event_row(2, "Good", "2030-06-11 14:00:00", "2030-06-11 15:00:00", json!([3])),
        ])),
        // alarm 3, resolved once per carrying event
        Ok(json!([{ "id": 3, "duration": 30, "interval": "minutes" }])),
        Ok(json!([{ "id": 3, "duration": 30, "interval": "minutes" }])),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let chain = CalendarSync::new(rpc, SnapshotStore::new(dir.path().join("e.json")));

    let scheduler = RecordingScheduler::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (report, schedule) = chain
        .sync_and_schedule(session(), &scheduler, now)
        .await
        .unwrap();

    // The broken event stays visible and lands in the snapshot.
    assert_eq!(report.outcome, SyncOutcome::Fetched);
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.malformed_events, 1);
    assert_eq!(chain.snapshot().load().len(), 2);

    // Only the healthy event gets a reminder.
    assert_eq!(schedule.reminders.len(), 1);
    assert_eq!(schedule.reminders[0].event_id, 2);
    assert_eq!(*scheduler.keys.lock().unwrap(), vec![2]);
}
