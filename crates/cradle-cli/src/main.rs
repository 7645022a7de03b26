use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cradle_cli::commands::{
    edit, export, goals, growth, history, import, init, insights, log, merge, milestones, next,
    remove, today, watch, week, words,
};
use cradle_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(cradle_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = cradle_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Init(args) => init::run(&mut out, &mut db, &config, args)?,
        Commands::Goals(args) => goals::run(&mut out, &mut db, &config, args)?,
        Commands::Log(args) => log::run(&mut out, &mut db, &config, args)?,
        Commands::Edit(args) => edit::run(&mut out, &mut db, &config, args)?,
        Commands::Remove { id } => remove::run(&mut out, &mut db, &config, id)?,
        Commands::History(args) => history::run(&mut out, &db, &config, args)?,
        Commands::Today { json } => today::run(&mut out, &db, &config, *json)?,
        Commands::Week { json } => week::run(&mut out, &db, &config, *json)?,
        Commands::Growth { json } => growth::run(&mut out, &db, &config, *json)?,
        Commands::Next(args) => next::run(&mut out, &db, &config, args)?,
        Commands::Insights { json } => insights::run(&mut out, &db, &config, *json)?,
        Commands::Milestones(action) => milestones::run(&mut out, &mut db, &config, action)?,
        Commands::Words(action) => words::run(&mut out, &mut db, &config, action)?,
        Commands::Merge { file } => merge::run(&mut out, &mut db, &config, file)?,
        Commands::Export => export::run(&mut out, &db, &config)?,
        Commands::Import { file } => import::run(&mut out, &mut db, &config, file)?,
        Commands::Watch(args) => watch::run(&mut out, &db, &config, args)?,
    }

    Ok(())
}
