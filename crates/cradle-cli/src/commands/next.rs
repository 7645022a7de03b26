//! Next command for countdowns and the next predicted event.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use clap::Args;
use cradle_core::schedule::format_countdown;
use cradle_core::{Category, Countdown, Prediction, Tracker};
use cradle_db::Database;
use serde::Serialize;

use super::util::load_tracker;
use crate::Config;

#[derive(Debug, Args)]
pub struct NextArgs {
    /// Categories with a session in progress (e.g. a running pump timer).
    #[arg(long = "active", value_name = "CATEGORY")]
    pub active: Vec<Category>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CountdownJson {
    category: Category,
    next_expected: DateTime<Utc>,
    remaining_minutes: Option<i64>,
    display: String,
}

impl From<&Countdown> for CountdownJson {
    fn from(countdown: &Countdown) -> Self {
        Self {
            category: countdown.category,
            next_expected: countdown.next_expected,
            remaining_minutes: countdown.remaining.map(|r| r.num_minutes()),
            display: format_countdown(countdown),
        }
    }
}

#[derive(Debug, Serialize)]
struct NextJson {
    countdowns: Vec<CountdownJson>,
    prediction: Option<Prediction>,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, args: &NextArgs) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;
    for category in &args.active {
        tracker.set_active(*category, true);
    }

    if args.json {
        let output = NextJson {
            countdowns: tracker.countdowns().iter().map(CountdownJson::from).collect(),
            prediction: tracker.prediction(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        write!(writer, "{}", render(&tracker))?;
    }
    Ok(())
}

/// Renders the current countdowns of `tracker`.
pub fn render(tracker: &Tracker) -> String {
    format_next(
        &tracker.countdowns(),
        tracker.prediction().as_ref(),
        tracker.now().offset(),
    )
}

pub fn format_next(
    countdowns: &[Countdown],
    prediction: Option<&Prediction>,
    offset: &FixedOffset,
) -> String {
    let mut output = String::new();
    for countdown in countdowns {
        let display = format_countdown(countdown);
        write!(output, "  {:<9}{display:>12}", countdown.category.as_str()).unwrap();
        if countdown.remaining.is_some() {
            let at = countdown.next_expected.with_timezone(offset).format("%H:%M");
            write!(output, "  at {at}").unwrap();
        }
        writeln!(output).unwrap();
    }

    match prediction {
        Some(p) => {
            let at = p.expected_at.with_timezone(offset).format("%H:%M");
            writeln!(
                output,
                "Next up: {} around {at} (confidence {})",
                p.category, p.confidence
            )
            .unwrap();
        }
        None => writeln!(output, "No prediction yet.").unwrap(),
    }
    output
}
