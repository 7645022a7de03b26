//! Watch command for periodically refreshed countdowns.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use cradle_core::{Category, Tracker};
use cradle_db::Database;

use super::next;
use super::util::load_tracker;
use crate::Config;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Categories with a session in progress.
    #[arg(long = "active", value_name = "CATEGORY")]
    pub active: Vec<Category>,

    /// Stop after this many refreshes instead of waiting for Ctrl-C.
    #[arg(long)]
    pub ticks: Option<u64>,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, args: &WatchArgs) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime.block_on(watch(writer, db, config, args))
}

fn refresh(db: &Database, config: &Config, active: &[Category]) -> Result<Tracker> {
    // Reload so events logged by other invocations show up.
    let mut tracker = load_tracker(db, config)?;
    for category in active {
        tracker.set_active(*category, true);
    }
    tracker.tick();
    Ok(tracker)
}

async fn watch<W: Write>(writer: &mut W, db: &Database, config: &Config, args: &WatchArgs) -> Result<()> {
    let mut interval = tokio::time::interval(config.refresh_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut refreshes = 0_u64;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::debug!(refreshes, "watch interrupted");
                break;
            }
            _ = interval.tick() => {
                let tracker = refresh(db, config, &args.active)?;
                writeln!(writer, "{}", tracker.now().format("%H:%M:%S"))?;
                write!(writer, "{}", next::render(&tracker))?;
                writer.flush()?;

                refreshes += 1;
                if args.ticks.is_some_and(|limit| refreshes >= limit) {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use cradle_core::CareEvent;

    #[tokio::test]
    async fn stops_after_requested_refreshes() {
        let mut db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(cradle_core::SystemClock, cradle_core::ScheduleConfig::default());
        tracker
            .append(CareEvent::new(Category::Feeding, Utc::now(), "Bottle"))
            .unwrap();
        db.save_snapshot(&tracker.snapshot()).unwrap();

        let config = Config {
            refresh_seconds: 1,
            ..Config::default()
        };
        let args = WatchArgs {
            active: vec![Category::Pumping],
            ticks: Some(2),
        };
        let mut output = Vec::new();
        watch(&mut output, &db, &config, &args).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("Next up: feeding").count(), 2);
        assert_eq!(output.matches("In progress").count(), 2);
    }
}
