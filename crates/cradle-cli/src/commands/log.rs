//! Log command for recording a care event.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use cradle_core::{CareEvent, Category, Measurements, Mood, UnitSystem};
use cradle_db::Database;

use super::util::{format_local, load_tracker, parse_instant, save_tracker};
use crate::Config;

/// Measurement flags shared by `log` and `edit`, in the profile's units.
#[derive(Debug, Default, Args)]
pub struct MeasurementArgs {
    /// Weight (kg, or lb with imperial units).
    #[arg(long)]
    pub weight: Option<f64>,

    /// Height (cm, or in with imperial units).
    #[arg(long)]
    pub height: Option<f64>,

    /// Head circumference (cm, or in with imperial units).
    #[arg(long)]
    pub head: Option<f64>,
}

impl MeasurementArgs {
    /// Converts to metric measurements, or `None` when no flag was given.
    pub fn to_measurements(&self, units: UnitSystem) -> Result<Option<Measurements>> {
        if self.weight.is_none() && self.height.is_none() && self.head.is_none() {
            return Ok(None);
        }
        let measurements = Measurements::new(
            self.weight.map(|w| units.weight_to_kg(w)),
            self.height.map(|h| units.length_to_cm(h)),
            self.head.map(|h| units.length_to_cm(h)),
        )
        .context("invalid measurement")?;
        Ok(Some(measurements))
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Category: feeding, pumping, diaper, sleep, milestone, activity or growth.
    pub category: Category,

    /// Short description, e.g. "Bottle" or "Tummy time".
    pub label: Option<String>,

    /// When it happened: "now", ISO 8601, or relative ("2 hours ago").
    #[arg(long, default_value = "now")]
    pub at: String,

    /// Mood: happy, neutral, sleepy, fussy or upset.
    #[arg(long)]
    pub mood: Option<Mood>,

    /// Duration in minutes.
    #[arg(long)]
    pub duration: Option<u32>,

    /// Free-form note.
    #[arg(long)]
    pub note: Option<String>,

    #[command(flatten)]
    pub measurements: MeasurementArgs,
}

/// Builds the event described by `args`.
pub fn build_event(args: &LogArgs, now: DateTime<Utc>, units: UnitSystem) -> Result<CareEvent> {
    let timestamp = parse_instant(&args.at, now)?;
    if timestamp > now {
        anyhow::bail!("cannot log an event in the future");
    }

    let label = args
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(|| default_label(args.category), ToString::to_string);

    let mut event = CareEvent::new(args.category, timestamp, label);
    if let Some(mood) = args.mood {
        event = event.with_mood(mood);
    }
    if let Some(minutes) = args.duration {
        event = event.with_duration(minutes);
    }
    if let Some(note) = args.note.as_deref().filter(|n| !n.trim().is_empty()) {
        event = event.with_note(note);
    }
    if let Some(measurements) = args.measurements.to_measurements(units)? {
        event = event.with_measurements(measurements);
    }
    Ok(event)
}

fn default_label(category: Category) -> String {
    let name = category.as_str();
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, args: &LogArgs) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;
    let units = tracker.profile().map(|p| p.units).unwrap_or_default();
    let event = build_event(args, tracker.now().with_timezone(&Utc), units)?;
    let id = event.id.clone();
    let when = format_local(event.timestamp, tracker.now().offset());

    tracker.append(event).context("failed to record event")?;
    save_tracker(db, &tracker)?;

    writeln!(writer, "Logged {} at {when}: {id}", args.category)?;
    Ok(())
}
