//! Per-day and rolling-week statistics derived from the event store.
//!
//! Calendar days are taken in the caller's UTC offset, so an event logged
//! at 23:30 local time counts toward that local day.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::event::CareEvent;
use crate::profile::WeeklyGoals;
use crate::store::{EventStore, Order};

/// Days in the rolling window.
pub const WEEK_DAYS: i64 = 7;

/// Counts and durations for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub feedings: u32,
    pub pumpings: u32,
    pub diapers: u32,
    pub milestones: u32,
    pub sleep_hours: f64,
    pub tummy_minutes: u32,
    pub play_minutes: u32,
    /// Number of activity events of any kind.
    pub activities: u32,
}

impl DailyStats {
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            feedings: 0,
            pumpings: 0,
            diapers: 0,
            milestones: 0,
            sleep_hours: 0.0,
            tummy_minutes: 0,
            play_minutes: 0,
            activities: 0,
        }
    }

    fn add(&mut self, event: &CareEvent) {
        match event.category {
            Category::Feeding => self.feedings += 1,
            Category::Pumping => self.pumpings += 1,
            Category::Diaper => self.diapers += 1,
            Category::Milestone => self.milestones += 1,
            Category::Sleep => self.sleep_hours += f64::from(event.minutes()) / 60.0,
            Category::Activity => {
                self.activities += 1;
                if is_tummy_time(event) {
                    self.tummy_minutes = self.tummy_minutes.saturating_add(event.minutes());
                } else {
                    self.play_minutes = self.play_minutes.saturating_add(event.minutes());
                }
            }
            Category::Growth => {}
        }
    }
}

/// Whether an activity event is tummy time (case-insensitive label match).
pub fn is_tummy_time(event: &CareEvent) -> bool {
    event.category == Category::Activity && event.label.to_lowercase().contains("tummy")
}

/// The calendar day of `timestamp` in `offset`.
pub fn local_date(timestamp: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(offset).date_naive()
}

/// Statistics for a single day.
pub fn daily_stats(store: &EventStore, date: NaiveDate, offset: &FixedOffset) -> DailyStats {
    let offset = *offset;
    let mut stats = DailyStats::empty(date);
    for event in store.query(Order::Ascending, move |e| local_date(e.timestamp, &offset) == date) {
        stats.add(event);
    }
    stats
}

/// The last seven days ending at `today`, oldest first.
pub fn weekly_series(store: &EventStore, today: NaiveDate, offset: &FixedOffset) -> Vec<DailyStats> {
    let start = today - Duration::days(WEEK_DAYS - 1);
    let mut days: BTreeMap<NaiveDate, DailyStats> = (0..WEEK_DAYS)
        .map(|i| start + Duration::days(i))
        .map(|date| (date, DailyStats::empty(date)))
        .collect();

    for event in store.query(Order::Ascending, |_| true) {
        if let Some(stats) = days.get_mut(&local_date(event.timestamp, offset)) {
            stats.add(event);
        }
    }
    days.into_values().collect()
}

/// Consecutive days with at least one event, walking back from `today`.
///
/// A day without events ends the streak, including `today` itself.
pub fn streak(store: &EventStore, today: NaiveDate, offset: &FixedOffset) -> u32 {
    let active: HashSet<NaiveDate> = store
        .query(Order::Descending, |_| true)
        .map(|e| local_date(e.timestamp, offset))
        .collect();

    let mut count = 0;
    let mut day = today;
    while active.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

/// Seven-day totals divided by the weekly goals. Not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub feedings: f64,
    pub sleep: f64,
    pub diapers: f64,
    pub tummy_time: f64,
}

impl WeeklyProgress {
    pub fn compute(week: &[DailyStats], goals: &WeeklyGoals) -> Self {
        let total = |field: fn(&DailyStats) -> u32| {
            week.iter().map(field).fold(0_u32, u32::saturating_add)
        };
        let feedings = total(|d| d.feedings);
        let sleep: f64 = week.iter().map(|d| d.sleep_hours).sum();
        let diapers = total(|d| d.diapers);
        let tummy = total(|d| d.tummy_minutes);
        Self {
            feedings: ratio(f64::from(feedings), f64::from(goals.feedings)),
            sleep: ratio(sleep, goals.sleep_hours),
            diapers: ratio(f64::from(diapers), f64::from(goals.diapers)),
            tummy_time: ratio(f64::from(tummy), f64::from(goals.tummy_minutes)),
        }
    }
}

fn ratio(total: f64, goal: f64) -> f64 {
    if goal > 0.0 { total / goal } else { 0.0 }
}

/// Everything the aggregation engine derives, as of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub as_of: NaiveDate,
    pub today: DailyStats,
    /// Oldest first, ending with today.
    pub week: Vec<DailyStats>,
    pub progress: WeeklyProgress,
    pub streak: u32,
}

impl Aggregates {
    pub fn compute(store: &EventStore, goals: &WeeklyGoals, now: DateTime<FixedOffset>) -> Self {
        let offset = *now.offset();
        let today = now.date_naive();
        let week = weekly_series(store, today, &offset);
        let today_stats = week
            .last()
            .cloned()
            .unwrap_or_else(|| DailyStats::empty(today));
        Self {
            as_of: today,
            progress: WeeklyProgress::compute(&week, goals),
            streak: streak(store, today, &offset),
            today: today_stats,
            week,
        }
    }

    /// Average daily sleep over the window, in hours.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_sleep_hours(&self) -> f64 {
        if self.week.is_empty() {
            return 0.0;
        }
        self.week.iter().map(|d| d.sleep_hours).sum::<f64>() / self.week.len() as f64
    }

    /// Feeding count per day, oldest first.
    pub fn daily_feedings(&self) -> Vec<u32> {
        self.week.iter().map(|d| d.feedings).collect()
    }
}
