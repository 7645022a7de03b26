//! Import command for replacing local data with a snapshot.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use cradle_core::{Snapshot, SystemClock, Tracker};
use cradle_db::Database;

use super::util::save_tracker;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let snapshot = Snapshot::from_json(&json)
        .with_context(|| format!("invalid snapshot in {}", file.display()))?;

    let tracker = Tracker::from_snapshot(snapshot, SystemClock, config.schedule);
    save_tracker(db, &tracker)?;

    writeln!(
        writer,
        "Imported {} events, {} growth entries, {} milestones, {} words",
        tracker.store().len(),
        tracker.growth().len(),
        tracker.milestones().records().len(),
        tracker.vocabulary().len()
    )?;
    Ok(())
}
