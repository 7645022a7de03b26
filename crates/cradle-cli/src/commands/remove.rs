//! Remove command for deleting an event.

use std::io::Write;

use anyhow::Result;
use cradle_core::EventId;
use cradle_db::Database;

use super::util::{load_tracker, save_tracker};
use crate::Config;

/// Deletes an event. An unknown ID is reported but is not an error.
pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, id: &str) -> Result<()> {
    let id = EventId::new(id)?;
    let mut tracker = load_tracker(db, config)?;

    if tracker.remove(&id) {
        save_tracker(db, &tracker)?;
        writeln!(writer, "Removed {id}")?;
    } else {
        writeln!(writer, "No event with id {id}")?;
    }
    Ok(())
}
