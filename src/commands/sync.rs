use anyhow::{Result, bail};
use chrono::Utc;
use odocal_core::{CalendarSync, HttpRpcClient, SnapshotStore, SyncOutcome};
use owo_colors::OwoColorize;

use crate::profile::Profile;
use crate::render::render_events;
use crate::scheduler::LogScheduler;

pub async fn run() -> Result<()> {
    let Some(profile) = Profile::load()? else {
        bail!("Not logged in. Run {} first", "odocal login".bold());
    };

    let chain = CalendarSync::new(HttpRpcClient::new()?, SnapshotStore::default_location()?);

    let (report, schedule) = match chain
        .sync_and_schedule(profile.to_session(), &LogScheduler, Utc::now())
        .await
    {
        Ok(result) => result,
        Err(err) if err.is_transport() => {
            // Same fallback as a mid-chain wire failure: show what we
            // have cached.
            eprintln!("{} ({err})", "Server unreachable, showing cached events".yellow());
            let report = chain
                .load_calendar_events(profile.to_session(), false)
                .await?;
            println!("{}", "(cached)".dimmed());
            println!("{}", render_events(&report.events));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match report.outcome {
        SyncOutcome::NoPartner => {
            println!("{}", "Your user has no partner record; no calendar available".yellow());
            return Ok(());
        }
        SyncOutcome::Degraded => {
            println!("{}", "(cached)".dimmed());
        }
        _ => {}
    }

    println!("{}", render_events(&report.events));

    if report.malformed_events > 0 || report.dropped_alarm_ids > 0 {
        println!(
            "{}",
            format!(
                "{} event(s) with unusable times (shown, no reminders), {} bad alarm id(s) dropped",
                report.malformed_events, report.dropped_alarm_ids
            )
            .yellow()
        );
    }

    // Reminders are re-derived each sync; only a fresh fetch has the
    // alarm ids worth resolving.
    if matches!(report.outcome, SyncOutcome::Fetched) {
        println!(
            "Registered {} reminder(s)",
            schedule.reminders.len().to_string().green()
        );
        if schedule.indeterminate_alarms > 0 {
            println!(
                "{}",
                format!("{} alarm(s) could not be resolved", schedule.indeterminate_alarms)
                    .yellow()
            );
        }
    }

    Ok(())
}
