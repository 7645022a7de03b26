//! Init command for creating or updating the subject profile.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use cradle_core::{Sex, SubjectProfile, UnitSystem};
use cradle_db::Database;

use super::util::{load_tracker, parse_date, save_tracker};
use crate::Config;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// The subject's name.
    pub name: String,

    /// Birth date as YYYY-MM-DD.
    #[arg(long)]
    pub born: String,

    /// Sex for percentile tables (male or female).
    #[arg(long)]
    pub sex: Option<Sex>,

    /// Display units: metric or imperial.
    #[arg(long, default_value = "metric")]
    pub units: UnitSystem,
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, args: &InitArgs) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;
    let today = tracker.today();
    let birth_date = parse_date(&args.born, today)?;
    if birth_date > today {
        anyhow::bail!("birth date {birth_date} is in the future");
    }

    // Goals survive re-initialisation.
    let goals = tracker.goals();
    let mut profile = SubjectProfile::new(args.name.trim(), birth_date);
    profile.sex = args.sex;
    profile.units = args.units;
    profile.goals = goals;
    tracker.set_profile(profile);
    save_tracker(db, &tracker)?;

    writeln!(
        writer,
        "Profile saved: {}, born {birth_date} ({} weeks old)",
        args.name.trim(),
        tracker
            .profile()
            .map_or(0, |p| p.age_in_weeks(today))
    )?;
    Ok(())
}
