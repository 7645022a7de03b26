//! Today command for showing today's totals.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use cradle_core::{Aggregates, DailyStats};
use cradle_db::Database;
use serde::Serialize;

use super::util::{format_minutes, load_tracker};
use crate::Config;

#[derive(Debug, Serialize)]
struct TodayJson<'a> {
    #[serde(flatten)]
    today: &'a DailyStats,
    streak: u32,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, json: bool) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let aggregates = tracker.aggregates();
    if json {
        let output = TodayJson {
            today: &aggregates.today,
            streak: aggregates.streak,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        write!(writer, "{}", format_today(&aggregates))?;
    }
    Ok(())
}

/// Formats one labelled row.
pub(crate) fn row(output: &mut String, label: &str, value: &str) {
    writeln!(output, "  {label:<12}{value:>8}").unwrap();
}

/// Renders the daily totals for one day.
pub fn format_day(output: &mut String, stats: &DailyStats) {
    row(output, "Feedings", &stats.feedings.to_string());
    row(output, "Pumping", &stats.pumpings.to_string());
    row(output, "Diapers", &stats.diapers.to_string());
    row(output, "Sleep", &format!("{:.1}h", stats.sleep_hours));
    row(output, "Tummy time", &format_minutes(stats.tummy_minutes));
    row(output, "Play", &format_minutes(stats.play_minutes));
    row(output, "Activities", &stats.activities.to_string());
    row(output, "Milestones", &stats.milestones.to_string());
}

pub fn format_today(aggregates: &Aggregates) -> String {
    let mut output = String::new();
    writeln!(output, "Today ({})", aggregates.as_of).unwrap();
    format_day(&mut output, &aggregates.today);
    let unit = if aggregates.streak == 1 { "day" } else { "days" };
    writeln!(output, "Streak: {} {unit}", aggregates.streak).unwrap();
    output
}
