//! Core library for the odocal ecosystem.
//!
//! Synchronizes a user's Odoo calendar over JSON-RPC, keeps a local
//! snapshot for offline use, and turns server-side alarm policies into
//! timezone-correct reminder registrations. The HTTP transport and the
//! platform alarm service stay behind the [`rpc::RpcClient`] and
//! [`schedule::Scheduler`] seams.

pub mod alarm;
pub mod attendance;
pub mod auth;
pub mod error;
pub mod event;
pub mod identity;
pub mod rpc;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod sync;

pub use error::{OdooError, OdooResult};
pub use event::{CalendarEvent, EventTime};
pub use rpc::{HttpRpcClient, RpcClient};
pub use schedule::{Precision, RegisterOutcome, ScheduledReminder, Scheduler};
pub use session::Session;
pub use snapshot::SnapshotStore;
pub use sync::{CalendarSync, ScheduleReport, SyncOutcome, SyncReport};
