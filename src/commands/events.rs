use anyhow::Result;
use odocal_core::SnapshotStore;
use owo_colors::OwoColorize;

use crate::render::render_events;

/// Show the cached snapshot. Works fully offline.
pub fn run() -> Result<()> {
    let store = SnapshotStore::default_location()?;
    let events = store.load();

    if events.is_empty() {
        println!(
            "{}. Run {} while online to populate the cache",
            "No cached events".dimmed(),
            "odocal sync".bold()
        );
        return Ok(());
    }

    println!("{}", render_events(&events));
    Ok(())
}
