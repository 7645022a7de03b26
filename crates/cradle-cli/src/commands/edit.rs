//! Edit command for replacing an event's mutable fields.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use cradle_core::{CareEvent, Category, EventId, Measurements, Mood, UnitSystem};
use cradle_db::Database;

use super::log::MeasurementArgs;
use super::util::{load_tracker, save_tracker};
use crate::Config;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// The event ID.
    pub id: String,

    /// New category.
    #[arg(long)]
    pub category: Option<Category>,

    /// New label.
    #[arg(long)]
    pub label: Option<String>,

    /// New mood.
    #[arg(long)]
    pub mood: Option<Mood>,

    /// New duration in minutes.
    #[arg(long)]
    pub duration: Option<u32>,

    /// New note. An empty string clears it.
    #[arg(long)]
    pub note: Option<String>,

    /// Overrides only the measurements given.
    #[command(flatten)]
    pub measurements: MeasurementArgs,

    /// Drop all measurements.
    #[arg(long, conflicts_with_all = ["weight", "height", "head"])]
    pub clear_measurements: bool,
}

/// Applies the requested edits to a copy of `event`.
pub fn apply(args: &EditArgs, event: &CareEvent, units: UnitSystem) -> Result<CareEvent> {
    let mut edited = event.clone();
    if let Some(category) = args.category {
        edited.category = category;
    }
    if let Some(label) = args.label.as_deref().map(str::trim) {
        if label.is_empty() {
            anyhow::bail!("label cannot be empty");
        }
        edited.label = label.to_string();
    }
    if let Some(mood) = args.mood {
        edited.mood = mood;
    }
    if let Some(minutes) = args.duration {
        edited.duration = Some(minutes);
    }
    if let Some(note) = args.note.as_deref() {
        edited.note = (!note.trim().is_empty()).then(|| note.to_string());
    }
    if args.clear_measurements {
        edited.measurements = None;
    } else if let Some(given) = args.measurements.to_measurements(units)? {
        let current = edited.measurements.unwrap_or_default();
        edited.measurements = Some(Measurements {
            weight: given.weight.or(current.weight),
            height: given.height.or(current.height),
            head_circumference: given.head_circumference.or(current.head_circumference),
        });
    }
    Ok(edited)
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, args: &EditArgs) -> Result<()> {
    let id = EventId::new(args.id.as_str())?;
    let mut tracker = load_tracker(db, config)?;
    let units = tracker.profile().map(|p| p.units).unwrap_or_default();
    let Some(event) = tracker.store().get(&id) else {
        anyhow::bail!("no event with id {id}");
    };

    let edited = apply(args, event, units)?;
    tracker
        .replace(&id, edited)
        .with_context(|| format!("failed to edit event {id}"))?;
    save_tracker(db, &tracker)?;

    writeln!(writer, "Updated {id}")?;
    Ok(())
}
