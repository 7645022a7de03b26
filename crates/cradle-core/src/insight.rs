//! Rule-based observations and a next-likely-event prediction.
//!
//! Every rule is a pure function that yields zero or one [`Insight`].
//! Missing data never errors; it just produces no finding.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregates;
use crate::category::Category;
use crate::event::Mood;
use crate::growth::GrowthLog;
use crate::milestone::MilestoneBook;
use crate::schedule::{self, ScheduleConfig};
use crate::store::{EventStore, Order};
use crate::types::Confidence;

/// Recommended daily sleep for an infant, in hours.
pub const IDEAL_SLEEP_HOURS: f64 = 14.5;
/// How far below the ideal average sleep may fall before warning.
pub const SLEEP_WARNING_MARGIN: f64 = 2.0;
/// Minimum consistency score for a positive feeding finding.
pub const FEEDING_CONSISTENCY: f64 = 0.8;
/// Minimum average feedings per day for a positive feeding finding.
pub const FEEDING_MIN_DAILY: f64 = 7.0;
/// Events examined by the mood rule.
pub const MOOD_WINDOW: usize = 20;
/// Healthy monthly weight gain, in kilograms.
pub const HEALTHY_GAIN_KG_PER_MONTH: (f64, f64) = (0.5, 1.0);
/// Average month length used for growth rates.
pub const DAYS_PER_MONTH: f64 = 30.44;

const SLEEP_CONFIDENCE: Confidence = Confidence::clamped(0.85);
const FEEDING_CONFIDENCE: Confidence = Confidence::clamped(0.8);
const MOOD_CONFIDENCE: Confidence = Confidence::clamped(0.75);
const GROWTH_CONFIDENCE: Confidence = Confidence::clamped(0.9);
const PREDICTION_CONFIDENCE: Confidence = Confidence::clamped(0.7);

/// Which rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Sleep,
    Feeding,
    Milestone,
    Mood,
    Growth,
}

/// How a finding should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Warning,
    Exciting,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Warning => "warning",
            Self::Exciting => "exciting",
        };
        write!(f, "{s}")
    }
}

/// A human-readable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub tone: Tone,
    pub title: String,
    pub message: String,
    pub confidence: Confidence,
}

/// Sleep rule: seven-day average against [`IDEAL_SLEEP_HOURS`].
pub fn sleep_insight(aggregates: &Aggregates) -> Option<Insight> {
    if aggregates.week.iter().all(|d| d.sleep_hours <= 0.0) {
        return None;
    }
    let average = aggregates.average_sleep_hours();
    let (tone, title, message) = if average >= IDEAL_SLEEP_HOURS {
        (
            Tone::Positive,
            "Great sleep",
            format!("Averaging {average:.1}h of sleep a day this week."),
        )
    } else if average < IDEAL_SLEEP_HOURS - SLEEP_WARNING_MARGIN {
        (
            Tone::Warning,
            "Short on sleep",
            format!(
                "Averaging {average:.1}h of sleep a day, below the recommended {IDEAL_SLEEP_HOURS}h."
            ),
        )
    } else {
        return None;
    };
    Some(Insight {
        kind: InsightKind::Sleep,
        tone,
        title: title.to_string(),
        message,
        confidence: SLEEP_CONFIDENCE,
    })
}

/// `1 - stddev/mean` over daily counts, floored at zero.
///
/// Returns `None` for an empty series or a zero mean.
#[allow(clippy::cast_precision_loss)]
pub fn consistency(counts: &[u32]) -> Option<(f64, f64)> {
    if counts.is_empty() {
        return None;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().map(|c| f64::from(*c)).sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = counts
        .iter()
        .map(|c| (f64::from(*c) - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(((1.0 - variance.sqrt() / mean).max(0.0), mean))
}

/// Feeding rule: steady and frequent feeds across the week.
pub fn feeding_insight(aggregates: &Aggregates) -> Option<Insight> {
    let (score, mean) = consistency(&aggregates.daily_feedings())?;
    if score <= FEEDING_CONSISTENCY || mean < FEEDING_MIN_DAILY {
        return None;
    }
    Some(Insight {
        kind: InsightKind::Feeding,
        tone: Tone::Positive,
        title: "Consistent feeding".to_string(),
        message: format!("About {mean:.0} feeds a day with a steady rhythm."),
        confidence: FEEDING_CONFIDENCE,
    })
}

/// Milestone rule: the next incomplete milestone to look out for.
#[allow(clippy::cast_possible_truncation)]
pub fn milestone_insight(milestones: &MilestoneBook) -> Option<Insight> {
    let next = milestones.next_incomplete()?;
    let ratio = milestones.completion_ratio();
    Some(Insight {
        kind: InsightKind::Milestone,
        tone: Tone::Exciting,
        title: format!("Coming up: {}", next.title),
        message: format!(
            "Usually between {} and {} weeks.",
            next.min_age_weeks, next.max_age_weeks
        ),
        confidence: Confidence::clamped(0.4f64.mul_add(ratio, 0.5) as f32),
    })
}

/// Mood rule: share of happy events among the most recent ones.
#[allow(clippy::cast_precision_loss)]
pub fn mood_insight(store: &EventStore) -> Option<Insight> {
    let recent: Vec<Mood> = store
        .query(Order::Descending, |_| true)
        .take(MOOD_WINDOW)
        .map(|e| e.mood)
        .collect();
    if recent.is_empty() {
        return None;
    }
    let happy = recent.iter().filter(|m| **m == Mood::Happy).count();
    let fraction = happy as f64 / recent.len() as f64;
    let (tone, title) = if fraction > 0.7 {
        (Tone::Positive, "Happy days")
    } else if fraction < 0.3 {
        (Tone::Warning, "Fussy stretch")
    } else {
        return None;
    };
    Some(Insight {
        kind: InsightKind::Mood,
        tone,
        title: title.to_string(),
        message: format!(
            "{:.0}% of the last {} events were happy.",
            fraction * 100.0,
            recent.len()
        ),
        confidence: MOOD_CONFIDENCE,
    })
}

/// Monthly weight gain between the earliest and latest of the last three entries.
#[allow(clippy::cast_precision_loss)]
pub fn monthly_weight_gain(growth: &GrowthLog) -> Option<f64> {
    let entries = growth.entries();
    if entries.len() < 3 {
        return None;
    }
    let last_three = &entries[entries.len() - 3..];
    let (first, last) = (&last_three[0], &last_three[2]);
    if first.weight <= 0.0 || last.weight <= 0.0 {
        return None;
    }
    let days = (last.date - first.date).num_seconds() as f64 / 86_400.0;
    if days <= 0.0 {
        return None;
    }
    Some((last.weight - first.weight) / (days / DAYS_PER_MONTH))
}

/// Growth rule: healthy monthly weight gain.
pub fn growth_insight(growth: &GrowthLog) -> Option<Insight> {
    let rate = monthly_weight_gain(growth)?;
    let (low, high) = HEALTHY_GAIN_KG_PER_MONTH;
    if !(low..=high).contains(&rate) {
        return None;
    }
    Some(Insight {
        kind: InsightKind::Growth,
        tone: Tone::Positive,
        title: "Healthy growth".to_string(),
        message: format!("Gaining about {rate:.2} kg a month."),
        confidence: GROWTH_CONFIDENCE,
    })
}

/// All findings, in rule order: sleep, feeding, milestone, mood, growth.
pub fn insights(
    aggregates: &Aggregates,
    store: &EventStore,
    growth: &GrowthLog,
    milestones: &MilestoneBook,
) -> Vec<Insight> {
    [
        sleep_insight(aggregates),
        feeding_insight(aggregates),
        milestone_insight(milestones),
        mood_insight(store),
        growth_insight(growth),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// The event expected to happen next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: Category,
    pub expected_at: DateTime<Utc>,
    pub confidence: Confidence,
}

/// Predicts the next event from the scheduled countdowns.
///
/// Only categories with history and no active session take part, so an
/// empty store predicts nothing.
pub fn predict_next(
    store: &EventStore,
    config: &ScheduleConfig,
    active: &HashSet<Category>,
    now: DateTime<Utc>,
) -> Option<Prediction> {
    schedule::countdowns(store, config, active, now)
        .into_iter()
        .filter(|c| c.remaining.is_some() && store.latest(c.category).is_some())
        .min_by_key(|c| c.next_expected)
        .map(|c| Prediction {
            category: c.category,
            expected_at: c.next_expected,
            confidence: PREDICTION_CONFIDENCE,
        })
}
