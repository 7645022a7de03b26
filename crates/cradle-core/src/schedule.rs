//! "Next expected event" countdowns.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::store::EventStore;

/// Categories that get a countdown, in display order.
pub const SCHEDULED: [Category; 3] = [Category::Feeding, Category::Pumping, Category::Diaper];

/// Longest interval override honored, one century.
pub const MAX_INTERVAL_HOURS: f64 = 24.0 * 365.0 * 100.0;

/// Expected interval between events, per scheduled category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub feeding_hours: f64,
    pub pumping_hours: f64,
    pub diaper_hours: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            feeding_hours: 3.0,
            pumping_hours: 3.0,
            diaper_hours: 2.0,
        }
    }
}

impl ScheduleConfig {
    /// Interval for `category`, or `None` if it is not scheduled.
    ///
    /// Negative or NaN overrides count as zero and anything longer than
    /// [`MAX_INTERVAL_HOURS`] is capped.
    #[allow(clippy::cast_possible_truncation)]
    pub fn interval(&self, category: Category) -> Option<Duration> {
        let hours = match category {
            Category::Feeding => self.feeding_hours,
            Category::Pumping => self.pumping_hours,
            Category::Diaper => self.diaper_hours,
            _ => return None,
        };
        let hours = if hours.is_nan() {
            0.0
        } else {
            hours.clamp(0.0, MAX_INTERVAL_HOURS)
        };
        Some(Duration::try_seconds((hours * 3600.0).round() as i64).unwrap_or(Duration::MAX))
    }
}

/// Countdown state for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub category: Category,
    /// When the next event is expected. `now` if nothing was ever logged.
    pub next_expected: DateTime<Utc>,
    /// Time left until `next_expected`, floored at zero.
    ///
    /// `None` while an in-progress session for the category is active.
    pub remaining: Option<Duration>,
}

impl Countdown {
    /// Whether the event is due right now.
    pub fn is_due(&self) -> bool {
        self.remaining.is_some_and(|r| r <= Duration::zero())
    }
}

/// Computes the countdown for `category`.
///
/// `active` lists categories with an in-progress session (e.g. a running
/// pump timer); those report no countdown rather than zero.
pub fn countdown(
    store: &EventStore,
    config: &ScheduleConfig,
    category: Category,
    active: &HashSet<Category>,
    now: DateTime<Utc>,
) -> Option<Countdown> {
    let interval = config.interval(category)?;
    let next_expected = store
        .latest(category)
        .map_or(now, |last| {
            last.timestamp
                .checked_add_signed(interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
    let remaining = if active.contains(&category) {
        None
    } else {
        Some((next_expected - now).max(Duration::zero()))
    };
    Some(Countdown {
        category,
        next_expected,
        remaining,
    })
}

/// Countdowns for every scheduled category.
pub fn countdowns(
    store: &EventStore,
    config: &ScheduleConfig,
    active: &HashSet<Category>,
    now: DateTime<Utc>,
) -> Vec<Countdown> {
    SCHEDULED
        .iter()
        .filter_map(|category| countdown(store, config, *category, active, now))
        .collect()
}

/// Formats remaining time: `"Due Now"`, `"45m"` or `"2h 15m"`.
pub fn format_remaining(remaining: Duration) -> String {
    let total_minutes = remaining.num_minutes();
    if total_minutes <= 0 {
        return "Due Now".to_string();
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats a countdown, including the suppressed state.
pub fn format_countdown(countdown: &Countdown) -> String {
    countdown
        .remaining
        .map_or_else(|| "In progress".to_string(), format_remaining)
}
