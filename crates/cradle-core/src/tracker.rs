//! The state holder that owns every collection and derived view.
//!
//! All mutation goes through [`Tracker`]. After each mutation the derived
//! aggregates are recomputed before the call returns, and subscribers get
//! a [`Change`] message. Aggregates are cached for the calendar day they
//! were computed on; a read on a later day recomputes instead.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::mpsc;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::aggregate::{self, Aggregates, DailyStats};
use crate::category::Category;
use crate::clock::{Clock, SystemClock};
use crate::event::CareEvent;
use crate::growth::{GrowthEntry, GrowthLog};
use crate::insight::{self, Insight, Prediction};
use crate::merge::{self, MergeReport};
use crate::milestone::{MilestoneBook, MilestoneCategory, MilestoneError};
use crate::percentile::GrowthPercentiles;
use crate::profile::{SubjectProfile, WeeklyGoals};
use crate::schedule::{self, Countdown, ScheduleConfig};
use crate::snapshot::{SNAPSHOT_VERSION, Snapshot};
use crate::store::{EventStore, StoreError};
use crate::types::{EventId, MilestoneId, WordId};
use crate::vocabulary::{Vocabulary, VocabularyError, Word, WordCategory};

/// What changed in a [`Tracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Appended(EventId),
    Removed(EventId),
    Replaced(EventId),
    Merged(MergeReport),
    Growth,
    Milestones,
    Vocabulary,
    Profile,
    /// Periodic refresh with no data change.
    Tick,
}

/// Owns the event store and everything derived from it.
#[derive(Debug)]
pub struct Tracker<C = SystemClock> {
    clock: C,
    store: EventStore,
    growth: GrowthLog,
    milestones: MilestoneBook,
    vocabulary: Vocabulary,
    profile: Option<SubjectProfile>,
    schedule: ScheduleConfig,
    active: HashSet<Category>,
    aggregates: Aggregates,
    subscribers: Vec<mpsc::Sender<Change>>,
}

impl<C: Clock> Tracker<C> {
    /// An empty tracker.
    pub fn new(clock: C, schedule: ScheduleConfig) -> Self {
        Self::from_snapshot(Snapshot::default(), clock, schedule)
    }

    /// Restores a tracker from a loaded snapshot.
    pub fn from_snapshot(snapshot: Snapshot, clock: C, schedule: ScheduleConfig) -> Self {
        let store = EventStore::from_events(snapshot.events);
        let goals = snapshot
            .profile
            .as_ref()
            .map(|p| p.goals)
            .unwrap_or_default();
        let aggregates = Aggregates::compute(&store, &goals, clock.now());
        tracing::debug!(events = store.len(), "tracker loaded");
        Self {
            clock,
            store,
            growth: GrowthLog::from_entries(snapshot.growth),
            milestones: MilestoneBook::from_records(snapshot.milestones),
            vocabulary: Vocabulary::from_words(snapshot.words),
            profile: snapshot.profile,
            schedule,
            active: HashSet::new(),
            aggregates,
            subscribers: Vec::new(),
        }
    }

    /// Everything needed to restore this tracker later.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            events: self.store.events().to_vec(),
            growth: self.growth.entries().to_vec(),
            milestones: self.milestones.records().to_vec(),
            words: self.vocabulary.words().to_vec(),
            profile: self.profile.clone(),
        }
    }

    /// Receives a [`Change`] after every mutation.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // ---- Ingestion ----

    pub fn append(&mut self, event: CareEvent) -> Result<(), StoreError> {
        if self.store.contains(&event.id) {
            return Err(StoreError::DuplicateId(event.id));
        }
        let id = event.id.clone();
        self.growth.on_append(&event);
        self.store.append(event)?;
        tracing::debug!(%id, "event appended");
        self.changed(Change::Appended(id));
        Ok(())
    }

    /// Removes an event. Unknown IDs are ignored and return `false`.
    pub fn remove(&mut self, id: &EventId) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }
        self.growth.on_remove(id);
        tracing::debug!(%id, "event removed");
        self.changed(Change::Removed(id.clone()));
        true
    }

    /// Overwrites an event in place and re-derives its growth entry.
    pub fn replace(&mut self, id: &EventId, event: CareEvent) -> Result<CareEvent, StoreError> {
        let previous = self.store.replace(id, event)?;
        if let Some(current) = self.store.get(id) {
            if previous.has_measurements() || current.has_measurements() {
                self.growth.on_replace(current);
            }
        }
        tracing::debug!(%id, "event replaced");
        self.changed(Change::Replaced(id.clone()));
        Ok(previous)
    }

    /// Merges a remote batch, skipping copies of known events.
    ///
    /// Idempotent: merging the same batch twice adds nothing the second time.
    pub fn merge_remote(&mut self, remote: &[CareEvent]) -> MergeReport {
        let mut seen = HashSet::new();
        let fresh: Vec<CareEvent> = merge::novel(self.store.events(), remote)
            .filter(|e| !self.store.contains(&e.id) && seen.insert(e.id.clone()))
            .cloned()
            .collect();
        let mut report = MergeReport {
            added: 0,
            duplicates: remote.len() - fresh.len(),
        };
        for event in fresh {
            self.growth.on_append(&event);
            if let Err(err) = self.store.append(event) {
                tracing::warn!(%err, "skipping remote event");
                continue;
            }
            report.added += 1;
        }
        tracing::info!(added = report.added, duplicates = report.duplicates, "merged remote events");
        self.changed(Change::Merged(report));
        report
    }

    /// Records a growth entry that does not come from an event.
    pub fn record_growth(&mut self, entry: GrowthEntry) {
        self.growth.record(entry);
        self.notify(&Change::Growth);
    }

    // ---- Milestones and vocabulary ----

    pub fn complete_milestone(&mut self, id: &MilestoneId, date: NaiveDate) -> Result<(), MilestoneError> {
        self.milestones.complete(id, date)?;
        self.notify(&Change::Milestones);
        Ok(())
    }

    pub fn uncomplete_milestone(&mut self, id: &MilestoneId) -> Result<(), MilestoneError> {
        self.milestones.uncomplete(id)?;
        self.notify(&Change::Milestones);
        Ok(())
    }

    pub fn add_milestone(
        &mut self,
        title: &str,
        min_age_weeks: u32,
        max_age_weeks: u32,
        category: MilestoneCategory,
        description: &str,
    ) -> Result<MilestoneId, MilestoneError> {
        let id = self
            .milestones
            .add_custom(title, min_age_weeks, max_age_weeks, category, description)?;
        self.notify(&Change::Milestones);
        Ok(id)
    }

    pub fn remove_milestone(&mut self, id: &MilestoneId) -> Result<(), MilestoneError> {
        self.milestones.remove_custom(id)?;
        self.notify(&Change::Milestones);
        Ok(())
    }

    pub fn add_word(
        &mut self,
        word: &str,
        category: WordCategory,
        date_first_said: NaiveDate,
        notes: Option<String>,
    ) -> Result<WordId, VocabularyError> {
        let id = self.vocabulary.add(word, category, date_first_said, notes)?;
        self.notify(&Change::Vocabulary);
        Ok(id)
    }

    pub fn update_word<F>(&mut self, id: &WordId, edit: F) -> Result<(), VocabularyError>
    where
        F: FnOnce(&mut Word),
    {
        self.vocabulary.update(id, edit)?;
        self.notify(&Change::Vocabulary);
        Ok(())
    }

    pub fn remove_word(&mut self, id: &WordId) -> Option<Word> {
        let removed = self.vocabulary.remove(id)?;
        self.notify(&Change::Vocabulary);
        Some(removed)
    }

    // ---- Configuration ----

    pub fn set_profile(&mut self, profile: SubjectProfile) {
        self.profile = Some(profile);
        self.changed(Change::Profile);
    }

    pub fn set_schedule(&mut self, schedule: ScheduleConfig) {
        self.schedule = schedule;
    }

    /// Marks an in-progress session (e.g. a running pump timer) for `category`.
    pub fn set_active(&mut self, category: Category, active: bool) {
        if active {
            self.active.insert(category);
        } else {
            self.active.remove(&category);
        }
    }

    /// Advisory periodic refresh.
    pub fn tick(&mut self) {
        self.changed(Change::Tick);
    }

    // ---- Read models ----

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn growth(&self) -> &GrowthLog {
        &self.growth
    }

    pub fn milestones(&self) -> &MilestoneBook {
        &self.milestones
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn profile(&self) -> Option<&SubjectProfile> {
        self.profile.as_ref()
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn goals(&self) -> WeeklyGoals {
        self.profile
            .as_ref()
            .map(|p| p.goals)
            .unwrap_or_default()
    }

    /// Aggregates for today. Cached unless the day rolled over.
    pub fn aggregates(&self) -> Cow<'_, Aggregates> {
        let now = self.clock.now();
        if self.aggregates.as_of == now.date_naive() {
            Cow::Borrowed(&self.aggregates)
        } else {
            Cow::Owned(Aggregates::compute(&self.store, &self.goals(), now))
        }
    }

    pub fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        aggregate::daily_stats(&self.store, date, self.clock.now().offset())
    }

    pub fn weekly_series(&self) -> Vec<DailyStats> {
        self.aggregates().week.clone()
    }

    /// Percentiles for a growth entry at the subject's age on that date.
    ///
    /// `None` without a profile, since age is unknown.
    pub fn percentiles_for(&self, entry: &GrowthEntry) -> Option<GrowthPercentiles> {
        let profile = self.profile.as_ref()?;
        let date = aggregate::local_date(entry.date, self.clock.now().offset());
        Some(GrowthPercentiles::for_entry(
            entry,
            profile.age_in_months(date),
            profile.sex,
        ))
    }

    /// Every growth entry with its percentiles, oldest first.
    pub fn percentile_report(&self) -> Vec<(GrowthEntry, GrowthPercentiles)> {
        self.growth
            .entries()
            .iter()
            .filter_map(|e| self.percentiles_for(e).map(|p| (e.clone(), p)))
            .collect()
    }

    pub fn countdown(&self, category: Category) -> Option<Countdown> {
        schedule::countdown(
            &self.store,
            &self.schedule,
            category,
            &self.active,
            self.clock.now_utc(),
        )
    }

    pub fn countdowns(&self) -> Vec<Countdown> {
        schedule::countdowns(&self.store, &self.schedule, &self.active, self.clock.now_utc())
    }

    pub fn insights(&self) -> Vec<Insight> {
        insight::insights(&self.aggregates(), &self.store, &self.growth, &self.milestones)
    }

    pub fn prediction(&self) -> Option<Prediction> {
        insight::predict_next(&self.store, &self.schedule, &self.active, self.clock.now_utc())
    }

    fn recompute(&mut self) {
        self.aggregates = Aggregates::compute(&self.store, &self.goals(), self.clock.now());
    }

    fn changed(&mut self, change: Change) {
        self.recompute();
        self.notify(&change);
    }

    fn notify(&mut self, change: &Change) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone, Utc};

    use crate::clock::FixedClock;
    use crate::event::{Measurements, Mood};
    use crate::profile::UnitSystem;

    fn start() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap().fixed_offset()
    }

    fn tracker() -> Tracker<FixedClock> {
        let mut tracker = Tracker::new(FixedClock(start()), ScheduleConfig::default());
        let birth = start().date_naive() - Duration::days(180);
        tracker.set_profile(SubjectProfile::new("Ada", birth));
        tracker
    }

    fn hours_ago(hours: i64) -> chrono::DateTime<Utc> {
        start().with_timezone(&Utc) - Duration::hours(hours)
    }

    #[test]
    fn overdue_feeding_is_due_now() {
        let mut tracker = tracker();
        tracker
            .append(CareEvent::new(Category::Feeding, hours_ago(4), "Bottle"))
            .unwrap();
        let countdown = tracker.countdown(Category::Feeding).unwrap();
        assert_eq!(countdown.remaining, Some(Duration::zero()));
        assert_eq!(schedule::format_countdown(&countdown), "Due Now");
    }

    #[test]
    fn append_then_remove_restores_aggregates() {
        let mut tracker = tracker();
        tracker
            .append(CareEvent::new(Category::Sleep, hours_ago(30), "Nap").with_duration(60))
            .unwrap();
        let before = tracker.aggregates().into_owned();

        let event = CareEvent::new(Category::Sleep, hours_ago(2), "Nap").with_duration(90);
        let id = event.id.clone();
        tracker.append(event).unwrap();
        assert_ne!(*tracker.aggregates(), before);

        assert!(tracker.remove(&id));
        assert_eq!(*tracker.aggregates(), before);
        assert!(!tracker.remove(&id));
    }

    #[test]
    fn measurement_events_drive_growth_entries() {
        let mut tracker = tracker();
        let event = CareEvent::new(Category::Growth, hours_ago(3), "Checkup")
            .with_measurements(Measurements::new(Some(7.9), Some(67.6), None).unwrap());
        let id = event.id.clone();
        tracker.append(event.clone()).unwrap();
        assert_eq!(tracker.growth().len(), 1);

        let edited = event.with_measurements(Measurements::new(Some(8.0), None, None).unwrap());
        tracker.replace(&id, edited).unwrap();
        let entry = tracker.growth().for_event(&id).unwrap();
        assert!((entry.weight - 8.0).abs() < f64::EPSILON);

        tracker.remove(&id);
        assert!(tracker.growth().is_empty());
    }

    #[test]
    fn failed_append_leaves_growth_untouched() {
        let mut tracker = tracker();
        let event = CareEvent::new(Category::Growth, hours_ago(3), "Checkup")
            .with_measurements(Measurements::new(Some(7.9), None, None).unwrap());
        tracker.append(event.clone()).unwrap();
        assert!(tracker.append(event).is_err());
        assert_eq!(tracker.growth().len(), 1);
    }

    #[test]
    fn percentiles_use_age_at_measurement() {
        let mut tracker = tracker();
        // Born 180 days before 2025-03-10: 2024-09-11. Five months on 2025-02-15.
        let at = Utc.with_ymd_and_hms(2025, 2, 15, 9, 0, 0).unwrap();
        tracker
            .append(
                CareEvent::new(Category::Growth, at, "Checkup")
                    .with_measurements(Measurements::new(Some(7.2), None, None).unwrap()),
            )
            .unwrap();
        let report = tracker.percentile_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].1.age_months, 5);
        assert!(report[0].1.weight.is_some());
    }

    #[test]
    fn two_month_scenario_without_sex_is_median() {
        let mut tracker = Tracker::new(FixedClock(start()), ScheduleConfig::default());
        let birth = start().date_naive() - Duration::days(70);
        tracker.set_profile(SubjectProfile::new("Ada", birth));
        tracker
            .append(
                CareEvent::new(Category::Growth, hours_ago(1), "Checkup")
                    .with_measurements(Measurements::new(Some(5.6), None, None).unwrap()),
            )
            .unwrap();
        let report = tracker.percentile_report();
        assert_eq!(report[0].1.age_months, 2);
        assert_eq!(report[0].1.weight, Some(50));
    }

    #[test]
    fn merge_discards_near_copies_and_is_idempotent() {
        let mut tracker = tracker();
        let local = CareEvent::new(Category::Feeding, hours_ago(1), "Bottle").with_mood(Mood::Happy);
        tracker.append(local.clone()).unwrap();

        let remote = vec![
            CareEvent::new(Category::Feeding, local.timestamp + Duration::seconds(30), "Bottle")
                .with_mood(Mood::Happy),
            CareEvent::new(Category::Diaper, hours_ago(2), "Wet"),
        ];
        let report = tracker.merge_remote(&remote);
        assert_eq!(report, MergeReport { added: 1, duplicates: 1 });
        assert_eq!(tracker.store().len(), 2);

        let again = tracker.merge_remote(&remote);
        assert_eq!(again, MergeReport { added: 0, duplicates: 2 });
        assert_eq!(tracker.store().len(), 2);

        let own = tracker.store().events().to_vec();
        assert!(tracker.merge_remote(&own).is_noop());
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let mut tracker = tracker();
        let rx = tracker.subscribe();
        let event = CareEvent::new(Category::Diaper, hours_ago(1), "Wet");
        let id = event.id.clone();
        tracker.append(event).unwrap();
        tracker.remove(&id);
        tracker.tick();

        let seen: Vec<Change> = rx.try_iter().collect();
        assert_eq!(
            seen,
            [Change::Appended(id.clone()), Change::Removed(id), Change::Tick]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut tracker = tracker();
        drop(tracker.subscribe());
        tracker.tick();
        assert!(tracker.subscribers.is_empty());
    }

    #[test]
    fn stale_cache_is_not_trusted_after_midnight() {
        let mut tracker = tracker();
        tracker
            .append(CareEvent::new(Category::Feeding, hours_ago(1), "Bottle"))
            .unwrap();
        assert_eq!(tracker.aggregates().streak, 1);

        tracker.clock_mut().advance(Duration::days(1));
        let aggregates = tracker.aggregates();
        assert_eq!(aggregates.as_of, start().date_naive() + Duration::days(1));
        assert_eq!(aggregates.streak, 0);
    }

    #[test]
    fn active_session_suppresses_countdown() {
        let mut tracker = tracker();
        tracker.set_active(Category::Pumping, true);
        assert!(tracker.countdown(Category::Pumping).unwrap().remaining.is_none());
        tracker.set_active(Category::Pumping, false);
        assert!(tracker.countdown(Category::Pumping).unwrap().remaining.is_some());
    }

    #[test]
    fn snapshot_round_trip_restores_state() {
        let mut tracker = tracker();
        tracker
            .append(
                CareEvent::new(Category::Growth, hours_ago(5), "Checkup")
                    .with_measurements(
                        Measurements::new(
                            Some(UnitSystem::Imperial.weight_to_kg(16.53)),
                            Some(UnitSystem::Imperial.length_to_cm(25.9)),
                            Some(42.0),
                        )
                        .unwrap(),
                    ),
            )
            .unwrap();
        tracker
            .complete_milestone(&MilestoneId::new("pre-rolls-over").unwrap(), start().date_naive())
            .unwrap();
        tracker
            .add_word("dada", WordCategory::People, start().date_naive(), None)
            .unwrap();

        let snapshot = tracker.snapshot();
        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let restored = Tracker::from_snapshot(decoded, FixedClock(start()), ScheduleConfig::default());
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(*restored.aggregates(), *tracker.aggregates());
    }

    #[test]
    fn weekly_sleep_scenario_warns() {
        let mut tracker = tracker();
        for day in 0..7 {
            tracker
                .append(
                    CareEvent::new(Category::Sleep, hours_ago(24 * day + 12), "Night")
                        .with_duration(480),
                )
                .unwrap();
        }
        assert!((tracker.aggregates().average_sleep_hours() - 8.0).abs() < 1e-9);
        let sleep = tracker
            .insights()
            .into_iter()
            .find(|i| i.kind == insight::InsightKind::Sleep)
            .unwrap();
        assert_eq!(sleep.tone, insight::Tone::Warning);
    }
}
