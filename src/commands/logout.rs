use anyhow::Result;
use odocal_core::SnapshotStore;
use owo_colors::OwoColorize;

use crate::profile::Profile;

/// Forget the stored profile and drop the cached events.
pub fn run() -> Result<()> {
    Profile::delete()?;
    SnapshotStore::default_location()?.clear()?;
    println!("{}", "Logged out".green());
    Ok(())
}
