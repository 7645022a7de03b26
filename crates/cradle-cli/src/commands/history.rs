//! History command for listing recorded events.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::FixedOffset;
use clap::Args;
use cradle_core::{CareEvent, Category, Mood, Order, UnitSystem};
use cradle_db::Database;

use super::util::{format_local, format_minutes, load_tracker};
use crate::Config;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only show this category.
    #[arg(long)]
    pub category: Option<Category>,

    /// Maximum number of events to show.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Oldest events first.
    #[arg(long)]
    pub oldest_first: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, args: &HistoryArgs) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let order = if args.oldest_first {
        Order::Ascending
    } else {
        Order::Descending
    };
    let category = args.category;
    let events: Vec<&CareEvent> = tracker
        .store()
        .query(order, move |e| category.is_none_or(|c| e.category == c))
        .take(args.limit)
        .collect();

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    } else {
        let units = tracker.profile().map(|p| p.units).unwrap_or_default();
        write!(writer, "{}", format_history(&events, tracker.now().offset(), units))?;
    }
    Ok(())
}

fn describe_measurements(event: &CareEvent, units: UnitSystem) -> Option<String> {
    let m = event.measurements?;
    let mut parts = Vec::new();
    if let Some(weight) = m.weight {
        parts.push(units.format_weight(weight));
    }
    if let Some(height) = m.height {
        parts.push(units.format_length(height));
    }
    if let Some(head) = m.head_circumference {
        parts.push(format!("head {}", units.format_length(head)));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Renders one line per event, in the order given.
pub fn format_history(events: &[&CareEvent], offset: &FixedOffset, units: UnitSystem) -> String {
    let mut output = String::new();
    if events.is_empty() {
        writeln!(output, "No events recorded.").unwrap();
        return output;
    }

    for event in events {
        write!(
            output,
            "{}  {:<9} {}",
            format_local(event.timestamp, offset),
            event.category.as_str(),
            event.label
        )
        .unwrap();
        if let Some(minutes) = event.duration {
            write!(output, " ({})", format_minutes(minutes)).unwrap();
        }
        if event.mood != Mood::Neutral {
            write!(output, " [{}]", event.mood).unwrap();
        }
        if let Some(measurements) = describe_measurements(event, units) {
            write!(output, " {measurements}").unwrap();
        }
        if let Some(note) = &event.note {
            write!(output, " - {note}").unwrap();
        }
        writeln!(output, "  {}", event.id).unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use cradle_core::{EventId, Measurements};
    use insta::assert_snapshot;

    fn events() -> Vec<CareEvent> {
        vec![
            CareEvent::new(
                Category::Feeding,
                Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap(),
                "Bottle",
            )
            .with_id(EventId::new("evt-2").unwrap())
            .with_mood(Mood::Happy)
            .with_duration(20),
            CareEvent::new(
                Category::Growth,
                Utc.with_ymd_and_hms(2025, 3, 9, 9, 30, 0).unwrap(),
                "Checkup",
            )
            .with_id(EventId::new("evt-1").unwrap())
            .with_note("clinic")
            .with_measurements(Measurements::new(Some(7.2), Some(66.0), None).unwrap()),
        ]
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn renders_event_lines() {
        let events = events();
        let refs: Vec<&CareEvent> = events.iter().collect();
        let output = format_history(&refs, &utc(), UnitSystem::Metric);
        assert_snapshot!(output, @r"
        2025-03-10 11:00  feeding   Bottle (20m) [happy]  evt-2
        2025-03-09 09:30  growth    Checkup 7.20 kg, 66.0 cm - clinic  evt-1
        ");
    }

    #[test]
    fn renders_in_local_offset() {
        let events = events();
        let output = format_history(
            &[&events[0]],
            &FixedOffset::east_opt(2 * 3600).unwrap(),
            UnitSystem::Metric,
        );
        assert!(output.starts_with("2025-03-10 13:00"));
    }

    #[test]
    fn renders_empty_history() {
        let output = format_history(&[], &utc(), UnitSystem::Metric);
        assert_snapshot!(output, @"No events recorded.");
    }
}
