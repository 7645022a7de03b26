//! Derived analytics for infant-care logs.
//!
//! This crate contains the data model and the pure logic for:
//! - Event store: de-duplicated, canonically ordered care events
//! - Percentiles: growth measurements against reference curves
//! - Aggregation: daily and weekly statistics, streaks and goal progress
//! - Countdowns and insights derived from the aggregates
//! - Merging event histories collected on different devices
//!
//! [`Tracker`] ties these together behind one state holder.

pub mod aggregate;
pub mod category;
pub mod clock;
pub mod event;
pub mod growth;
pub mod insight;
pub mod merge;
pub mod milestone;
pub mod percentile;
pub mod profile;
pub mod reference;
pub mod schedule;
pub mod snapshot;
pub mod store;
mod tracker;
pub mod types;
pub mod vocabulary;

pub use aggregate::{Aggregates, DailyStats, WeeklyProgress};
pub use category::{Category, UnknownCategory};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event::{CareEvent, Measurements, Mood};
pub use growth::{GrowthEntry, GrowthLog};
pub use insight::{Insight, InsightKind, Prediction, Tone};
pub use merge::MergeReport;
pub use milestone::{Milestone, MilestoneBook, MilestoneCategory, MilestoneError};
pub use percentile::GrowthPercentiles;
pub use profile::{Sex, SubjectProfile, UnitSystem, WeeklyGoals};
pub use reference::Metric;
pub use schedule::{Countdown, ScheduleConfig};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::{EventStore, Order, StoreError};
pub use tracker::{Change, Tracker};
pub use types::{Confidence, EntryId, EventId, MilestoneId, ValidationError, WordId};
pub use vocabulary::{Vocabulary, VocabularyError, Word, WordCategory};
