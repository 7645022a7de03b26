//! CLI subcommand implementations.

pub mod edit;
pub mod export;
pub mod goals;
pub mod growth;
pub mod history;
pub mod import;
pub mod init;
pub mod insights;
pub mod log;
pub mod merge;
pub mod milestones;
pub mod next;
pub mod remove;
pub mod today;
pub mod util;
pub mod watch;
pub mod week;
pub mod words;
