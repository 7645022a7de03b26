//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    edit::EditArgs, goals::GoalsArgs, history::HistoryArgs, init::InitArgs, log::LogArgs,
    milestones::MilestoneAddArgs, next::NextArgs, watch::WatchArgs, words::WordAddArgs,
    words::WordEditArgs,
};

/// Infant-care log.
///
/// Records feedings, sleep, diapers and growth, and derives daily totals,
/// countdowns, percentiles and insights from them.
#[derive(Debug, Parser)]
#[command(name = "cradle", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or update the subject profile.
    Init(InitArgs),

    /// Show or change the weekly goals.
    Goals(GoalsArgs),

    /// Record a care event.
    Log(LogArgs),

    /// Edit an existing event. Its timestamp cannot change.
    Edit(EditArgs),

    /// Delete an event by ID.
    Remove {
        /// The event ID.
        id: String,
    },

    /// List recorded events.
    History(HistoryArgs),

    /// Show today's totals and the current streak.
    Today {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the last seven days and progress toward the weekly goals.
    Week {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show growth measurements with percentiles.
    Growth {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show countdowns to the next expected feeding, pumping and diaper.
    Next(NextArgs),

    /// Show insights derived from recent data.
    Insights {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Track developmental milestones.
    #[command(subcommand)]
    Milestones(MilestonesAction),

    /// Track first words.
    #[command(subcommand)]
    Words(WordsAction),

    /// Merge events exported from another device.
    ///
    /// Accepts a snapshot from `cradle export` or a JSON array of events.
    /// Events within a minute of a matching local event are skipped.
    Merge {
        /// File to read the remote events from.
        file: PathBuf,
    },

    /// Write every record as a JSON snapshot to stdout.
    Export,

    /// Replace all data with a JSON snapshot.
    ///
    /// Records that fail to decode are skipped with a warning.
    Import {
        /// Snapshot file to read.
        file: PathBuf,
    },

    /// Refresh countdowns periodically until interrupted.
    Watch(WatchArgs),
}

/// Milestone subcommands.
#[derive(Debug, Subcommand)]
pub enum MilestonesAction {
    /// List milestones.
    List {
        /// Only milestones expected at the subject's current age.
        #[arg(long)]
        current: bool,
    },

    /// Mark a milestone as achieved.
    Complete {
        /// The milestone ID.
        id: String,

        /// Date achieved: YYYY-MM-DD, "today" or "yesterday".
        #[arg(long, default_value = "today")]
        on: String,
    },

    /// Clear a milestone's completion.
    Uncomplete {
        /// The milestone ID.
        id: String,
    },

    /// Add a custom milestone.
    Add(MilestoneAddArgs),

    /// Delete a custom milestone.
    Remove {
        /// The milestone ID.
        id: String,
    },
}

/// Vocabulary subcommands.
#[derive(Debug, Subcommand)]
pub enum WordsAction {
    /// List words in the order they were first said.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a word.
    Add(WordAddArgs),

    /// Change a word's spelling, category, date or notes.
    Edit(WordEditArgs),

    /// Delete a word by ID.
    Remove {
        /// The word ID.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_log_with_relative_time() {
        let cli = Cli::parse_from([
            "cradle", "log", "feeding", "Bottle", "--at", "2 hours ago", "--mood", "happy",
        ]);
        let Some(Commands::Log(args)) = cli.command else {
            panic!("expected log command");
        };
        assert_eq!(args.category, cradle_core::Category::Feeding);
        assert_eq!(args.label.as_deref(), Some("Bottle"));
        assert_eq!(args.at, "2 hours ago");
        assert_eq!(args.mood, Some(cradle_core::Mood::Happy));
    }

    #[test]
    fn parses_nested_milestone_command() {
        let cli = Cli::parse_from(["cradle", "milestones", "complete", "pre-rolls-over"]);
        let Some(Commands::Milestones(MilestonesAction::Complete { id, on })) = cli.command else {
            panic!("expected milestones complete");
        };
        assert_eq!(id, "pre-rolls-over");
        assert_eq!(on, "today");
    }
}
