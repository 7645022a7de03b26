//! Goals command for showing and changing the weekly targets.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use cradle_core::{WeeklyGoals, WeeklyProgress};
use cradle_db::Database;

use super::util::{load_tracker, save_tracker};
use crate::Config;

#[derive(Debug, Args)]
pub struct GoalsArgs {
    /// Feedings per week.
    #[arg(long)]
    pub feedings: Option<u32>,

    /// Hours of sleep per week.
    #[arg(long)]
    pub sleep_hours: Option<f64>,

    /// Diaper changes per week.
    #[arg(long)]
    pub diapers: Option<u32>,

    /// Minutes of tummy time per week.
    #[arg(long)]
    pub tummy_minutes: Option<u32>,
}

impl GoalsArgs {
    const fn is_empty(&self) -> bool {
        self.feedings.is_none()
            && self.sleep_hours.is_none()
            && self.diapers.is_none()
            && self.tummy_minutes.is_none()
    }

    fn apply(&self, goals: &mut WeeklyGoals) {
        if let Some(feedings) = self.feedings {
            goals.feedings = feedings;
        }
        if let Some(hours) = self.sleep_hours {
            goals.sleep_hours = hours;
        }
        if let Some(diapers) = self.diapers {
            goals.diapers = diapers;
        }
        if let Some(minutes) = self.tummy_minutes {
            goals.tummy_minutes = minutes;
        }
    }
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, args: &GoalsArgs) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;

    if !args.is_empty() {
        let Some(mut profile) = tracker.profile().cloned() else {
            anyhow::bail!("no profile yet; run `cradle init` first");
        };
        if args.sleep_hours.is_some_and(|h| !h.is_finite() || h < 0.0) {
            anyhow::bail!("sleep hours must be a non-negative number");
        }
        args.apply(&mut profile.goals);
        tracker.set_profile(profile);
        save_tracker(db, &tracker)?;
    }

    let aggregates = tracker.aggregates();
    write!(writer, "{}", format_goals(&tracker.goals(), &aggregates.progress))?;
    Ok(())
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Renders goals next to this week's progress.
pub fn format_goals(goals: &WeeklyGoals, progress: &WeeklyProgress) -> String {
    let mut output = String::new();
    writeln!(output, "Weekly goals").unwrap();
    writeln!(
        output,
        "  Feedings     {:>6}      {:>5}",
        goals.feedings,
        percent(progress.feedings)
    )
    .unwrap();
    writeln!(
        output,
        "  Sleep        {:>5.1}h      {:>5}",
        goals.sleep_hours,
        percent(progress.sleep)
    )
    .unwrap();
    writeln!(
        output,
        "  Diapers      {:>6}      {:>5}",
        goals.diapers,
        percent(progress.diapers)
    )
    .unwrap();
    writeln!(
        output,
        "  Tummy time   {:>5}m      {:>5}",
        goals.tummy_minutes,
        percent(progress.tummy_time)
    )
    .unwrap();
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn renders_goals_with_progress() {
        let progress = WeeklyProgress {
            feedings: 0.5,
            sleep: 0.25,
            diapers: 1.0,
            tummy_time: 0.0,
        };
        let output = format_goals(&WeeklyGoals::default(), &progress);
        assert_snapshot!(output, @r"
        Weekly goals
          Feedings         56        50%
          Sleep         98.0h        25%
          Diapers          42       100%
          Tummy time     210m         0%
        ");
    }

    #[test]
    fn args_only_touch_given_goals() {
        let args = GoalsArgs {
            feedings: Some(60),
            sleep_hours: None,
            diapers: None,
            tummy_minutes: Some(300),
        };
        let mut goals = WeeklyGoals::default();
        args.apply(&mut goals);
        assert_eq!(goals.feedings, 60);
        assert_eq!(goals.diapers, 42);
        assert_eq!(goals.tummy_minutes, 300);
    }
}
