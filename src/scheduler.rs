//! Stand-in for the platform alarm service.
//!
//! The OS-level delivery primitive is a collaborator outside this
//! tool; this implementation records registrations in the log so the
//! sync flow is complete end to end.

use chrono::DateTime;
use chrono_tz::Tz;
use odocal_core::{RegisterOutcome, Scheduler};
use tracing::info;

pub struct LogScheduler;

impl Scheduler for LogScheduler {
    fn register_exact(&self, key: i64, at: DateTime<Tz>) -> RegisterOutcome {
        info!(event_id = key, trigger = %at, precision = "exact", "reminder registered");
        RegisterOutcome::Registered
    }

    fn register_inexact(&self, key: i64, at: DateTime<Tz>) {
        info!(event_id = key, trigger = %at, precision = "inexact", "reminder registered");
    }

    fn request_exact_capability(&self) {
        info!("requested exact-scheduling capability");
    }
}
