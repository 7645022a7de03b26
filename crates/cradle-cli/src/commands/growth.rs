//! Growth command for measurements and their percentiles.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::FixedOffset;
use cradle_core::insight::monthly_weight_gain;
use cradle_core::percentile::bmi;
use cradle_core::{GrowthEntry, GrowthPercentiles, UnitSystem};
use cradle_db::Database;
use serde::Serialize;

use super::util::load_tracker;
use crate::Config;

#[derive(Debug, Serialize)]
struct GrowthRow<'a> {
    #[serde(flatten)]
    entry: &'a GrowthEntry,
    percentiles: Option<GrowthPercentiles>,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, json: bool) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let rows: Vec<(&GrowthEntry, Option<GrowthPercentiles>)> = tracker
        .growth()
        .entries()
        .iter()
        .map(|entry| (entry, tracker.percentiles_for(entry)))
        .collect();

    if json {
        let rows: Vec<GrowthRow<'_>> = rows
            .iter()
            .map(|(entry, percentiles)| GrowthRow {
                entry,
                percentiles: *percentiles,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    let units = tracker.profile().map(|p| p.units).unwrap_or_default();
    write!(writer, "{}", format_growth(&rows, tracker.now().offset(), units))?;
    if tracker.profile().is_none() && !rows.is_empty() {
        writeln!(writer, "Run `cradle init` to see percentiles.")?;
    }
    if let Some(gain) = monthly_weight_gain(tracker.growth()) {
        writeln!(writer, "Weight gain: {}/month", units.format_weight(gain))?;
    }
    Ok(())
}

fn metric_line(output: &mut String, label: &str, value: Option<String>, percentile: Option<u8>) {
    let value = value.unwrap_or_else(|| "-".to_string());
    let percentile = percentile.map(|p| format!("p{p}")).unwrap_or_default();
    let line = format!("  {label:<8}{value:>10}  {percentile}");
    writeln!(output, "{}", line.trim_end()).unwrap();
}

/// Renders each entry with the percentiles it could be given.
pub fn format_growth(
    rows: &[(&GrowthEntry, Option<GrowthPercentiles>)],
    offset: &FixedOffset,
    units: UnitSystem,
) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        writeln!(output, "No growth measurements recorded.").unwrap();
        return output;
    }

    let positive = |v: f64| (v > 0.0).then_some(v);
    for (entry, percentiles) in rows {
        let date = entry.date.with_timezone(offset).date_naive();
        match percentiles {
            Some(p) => writeln!(output, "{date} ({} months)", p.age_months).unwrap(),
            None => writeln!(output, "{date}").unwrap(),
        }
        metric_line(
            &mut output,
            "Weight",
            positive(entry.weight).map(|w| units.format_weight(w)),
            percentiles.and_then(|p| p.weight),
        );
        metric_line(
            &mut output,
            "Height",
            positive(entry.height).map(|h| units.format_length(h)),
            percentiles.and_then(|p| p.height),
        );
        metric_line(
            &mut output,
            "Head",
            positive(entry.head_circumference).map(|h| units.format_length(h)),
            percentiles.and_then(|p| p.head_circumference),
        );
        metric_line(
            &mut output,
            "BMI",
            bmi(entry.weight, entry.height).map(|b| format!("{b:.1}")),
            percentiles.and_then(|p| p.bmi),
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use cradle_core::EntryId;
    use insta::assert_snapshot;

    fn entry() -> GrowthEntry {
        GrowthEntry {
            id: EntryId::new("entry-1").unwrap(),
            source_event: None,
            date: Utc.with_ymd_and_hms(2025, 2, 15, 9, 0, 0).unwrap(),
            weight: 7.2,
            height: 66.0,
            head_circumference: 0.0,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn renders_percentiles_and_missing_fields() {
        let entry = entry();
        let percentiles = GrowthPercentiles {
            age_months: 5,
            weight: Some(48),
            height: Some(52),
            head_circumference: None,
            bmi: Some(40),
        };
        let output = format_growth(&[(&entry, Some(percentiles))], &utc(), UnitSystem::Metric);
        assert_snapshot!(output, @r"
        2025-02-15 (5 months)
          Weight     7.20 kg  p48
          Height     66.0 cm  p52
          Head             -
          BMI           16.5  p40
        ");
    }

    #[test]
    fn renders_imperial_without_profile() {
        let entry = entry();
        let output = format_growth(&[(&entry, None)], &utc(), UnitSystem::Imperial);
        assert_snapshot!(output, @r"
        2025-02-15
          Weight    15.87 lb
          Height     26.0 in
          Head             -
          BMI           16.5
        ");
    }
}
