//! Insights command.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use cradle_core::Insight;
use cradle_db::Database;

use super::util::load_tracker;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, json: bool) -> Result<()> {
    let tracker = load_tracker(db, config)?;
    let insights = tracker.insights();
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&insights)?)?;
    } else {
        write!(writer, "{}", format_insights(&insights))?;
    }
    Ok(())
}

pub fn format_insights(insights: &[Insight]) -> String {
    let mut output = String::new();
    if insights.is_empty() {
        writeln!(output, "Not enough data for insights yet.").unwrap();
        return output;
    }
    for insight in insights {
        writeln!(output, "[{}] {}", insight.tone, insight.title).unwrap();
        writeln!(
            output,
            "    {} (confidence {})",
            insight.message, insight.confidence
        )
        .unwrap();
    }
    output
}
