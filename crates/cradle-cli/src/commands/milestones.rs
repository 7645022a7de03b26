//! Milestones command for the catalog and custom milestones.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use cradle_core::{Milestone, MilestoneCategory, MilestoneId};
use cradle_db::Database;

use super::util::{load_tracker, parse_date, save_tracker};
use crate::{Config, MilestonesAction};

#[derive(Debug, Args)]
pub struct MilestoneAddArgs {
    /// Short title, e.g. "Claps hands".
    pub title: String,

    /// Earliest expected age in weeks.
    #[arg(long)]
    pub min_weeks: u32,

    /// Latest expected age in weeks.
    #[arg(long)]
    pub max_weeks: u32,

    /// Category: motor, social, language or cognitive.
    #[arg(long, default_value = "motor")]
    pub category: MilestoneCategory,

    /// Longer description.
    #[arg(long, default_value = "")]
    pub description: String,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    action: &MilestonesAction,
) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;

    match action {
        MilestonesAction::List { current } => {
            let milestones = if *current {
                let Some(profile) = tracker.profile() else {
                    anyhow::bail!("no profile yet; run `cradle init` first");
                };
                let weeks = profile.age_in_weeks(tracker.today());
                writeln!(writer, "Expected at {weeks} weeks:")?;
                tracker.milestones().window_for_age(weeks)
            } else {
                tracker.milestones().all()
            };
            write!(writer, "{}", format_milestones(&milestones))?;

            let all = tracker.milestones().all();
            let done = all.iter().filter(|m| m.is_completed).count();
            writeln!(
                writer,
                "Completed {done} of {} ({:.0}%)",
                all.len(),
                tracker.milestones().completion_ratio() * 100.0
            )?;
        }
        MilestonesAction::Complete { id, on } => {
            let id = MilestoneId::new(id.as_str())?;
            let date = parse_date(on, tracker.today())?;
            tracker
                .complete_milestone(&id, date)
                .with_context(|| format!("failed to complete {id}"))?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Completed {id} on {date}")?;
        }
        MilestonesAction::Uncomplete { id } => {
            let id = MilestoneId::new(id.as_str())?;
            tracker
                .uncomplete_milestone(&id)
                .with_context(|| format!("failed to uncomplete {id}"))?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Cleared {id}")?;
        }
        MilestonesAction::Add(args) => {
            let id = tracker.add_milestone(
                &args.title,
                args.min_weeks,
                args.max_weeks,
                args.category,
                &args.description,
            )?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Added milestone {id}")?;
        }
        MilestonesAction::Remove { id } => {
            let id = MilestoneId::new(id.as_str())?;
            tracker.remove_milestone(&id)?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Removed milestone {id}")?;
        }
    }
    Ok(())
}

pub fn format_milestones(milestones: &[Milestone]) -> String {
    let mut output = String::new();
    if milestones.is_empty() {
        writeln!(output, "No milestones.").unwrap();
        return output;
    }
    for m in milestones {
        let mark = if m.is_completed { 'x' } else { ' ' };
        write!(
            output,
            "[{mark}] {} ({}-{} weeks, {})",
            m.title, m.min_age_weeks, m.max_age_weeks, m.category
        )
        .unwrap();
        if let Some(date) = m.completed_date {
            write!(output, " achieved {date}").unwrap();
        }
        writeln!(output, "  {}", m.id).unwrap();
    }
    output
}
