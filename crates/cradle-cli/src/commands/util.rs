//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use cradle_core::{SystemClock, Tracker};
use cradle_db::Database;
use regex::Regex;

use crate::Config;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse an instant as "now", ISO 8601, or relative time.
///
/// Supports:
/// - "now"
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_instant(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Parse a calendar date as YYYY-MM-DD, "today" or "yesterday".
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    match s.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {other}. Use YYYY-MM-DD, 'today' or 'yesterday'")),
    }
}

/// Formats a total in minutes as "Xh Ym" or "Ym".
pub fn format_minutes(total: u32) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats an instant in the given offset for display.
pub fn format_local(timestamp: DateTime<Utc>, offset: &FixedOffset) -> String {
    timestamp
        .with_timezone(offset)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Restores the tracker from the database.
pub fn load_tracker(db: &Database, config: &Config) -> Result<Tracker> {
    let snapshot = db.load_snapshot().context("failed to load data")?;
    Ok(Tracker::from_snapshot(snapshot, SystemClock, config.schedule))
}

/// Writes the tracker's state back to the database.
pub fn save_tracker(db: &mut Database, tracker: &Tracker) -> Result<()> {
    db.save_snapshot(&tracker.snapshot())
        .context("failed to save data")
}
