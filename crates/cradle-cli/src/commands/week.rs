//! Week command for the seven-day series and goal progress.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use cradle_core::{Aggregates, WeeklyGoals};
use cradle_db::Database;

use super::goals::format_goals;
use super::util::{format_minutes, load_tracker};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, json: bool) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let aggregates = tracker.aggregates();
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&*aggregates)?)?;
    } else {
        write!(writer, "{}", format_week(&aggregates, &tracker.goals()))?;
    }
    Ok(())
}

pub fn format_week(aggregates: &Aggregates, goals: &WeeklyGoals) -> String {
    let mut output = String::new();
    writeln!(output, "Week ending {}", aggregates.as_of).unwrap();
    writeln!(
        output,
        "{:<10}  {:>4}  {:>4}  {:>6}  {:>6}  {:>6}",
        "Date", "Feed", "Pump", "Diaper", "Sleep", "Tummy"
    )
    .unwrap();
    for day in &aggregates.week {
        // chrono's Display ignores width, so pad pre-rendered strings
        let date = day.date.to_string();
        let sleep = format!("{:.1}h", day.sleep_hours);
        writeln!(
            output,
            "{date:<10}  {:>4}  {:>4}  {:>6}  {sleep:>6}  {:>6}",
            day.feedings,
            day.pumpings,
            day.diapers,
            format_minutes(day.tummy_minutes)
        )
        .unwrap();
    }
    writeln!(
        output,
        "Average sleep: {:.1}h/day",
        aggregates.average_sleep_hours()
    )
    .unwrap();
    writeln!(output).unwrap();
    output.push_str(&format_goals(goals, &aggregates.progress));
    output
}
