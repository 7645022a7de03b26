//! Export command for writing the full snapshot to stdout.

use std::io::Write;

use anyhow::{Context, Result};
use cradle_db::Database;

use super::util::load_tracker;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let json = tracker
        .snapshot()
        .to_json()
        .context("failed to encode snapshot")?;
    writeln!(writer, "{json}")?;
    Ok(())
}
