//! Infant-care log CLI library.
//!
//! This crate provides the CLI interface for the cradle tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, MilestonesAction, WordsAction};
pub use config::Config;
