//! Terminal rendering for core types using owo_colors.

use chrono::{Local, NaiveDateTime};
use odocal_core::CalendarEvent;
use owo_colors::OwoColorize;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        // A bound that never parsed is shown verbatim rather than
        // hiding the event.
        let time = match (self.start.local(), self.stop.local()) {
            (Some(start), _) if self.allday => {
                format!("{}  all day       ", start.format("%Y-%m-%d"))
            }
            (Some(start), Some(stop)) => format!(
                "{}  {} - {}",
                start.format("%Y-%m-%d"),
                start.format("%H:%M"),
                stop.format("%H:%M")
            ),
            _ => format!("{} - {}", self.start, self.stop),
        };

        let past = self.stop.local().is_some_and(is_past);
        let mut line = if past {
            format!("{}  {}", time.dimmed(), self.name.dimmed())
        } else {
            format!("{}  {}", time, self.name.bold())
        };

        if let Some(location) = &self.location {
            line.push_str(&format!("  @ {}", location.cyan()));
        }
        line
    }
}

fn is_past(stop: NaiveDateTime) -> bool {
    // Event times are wall-clock in the user's zone; comparing against
    // the machine's local clock is close enough for display.
    stop < Local::now().naive_local()
}

/// Render an event list with a trailing count line, or a placeholder
/// when empty.
pub fn render_events(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return format!("{}", "No events".dimmed());
    }
    let mut out: Vec<String> = events.iter().map(|e| e.render()).collect();
    out.push(format!("\n{} event(s)", events.len()));
    out.join("\n")
}
