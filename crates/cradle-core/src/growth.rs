//! Growth entries derived from measurement-carrying events.
//!
//! Whenever an event carries at least one positive measurement, a
//! [`GrowthEntry`] is materialized at the event's timestamp. Fields the
//! event leaves out are backfilled from the latest earlier entry that has a
//! positive value for that field. Each derived entry remembers the event it
//! came from, so edits and deletes update exactly one entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{CareEvent, positive};
use crate::types::{EntryId, EventId};

/// A backfilled snapshot of all three growth measurements at a point in time.
///
/// A field that could not be resolved from the event or from history is 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEntry {
    pub id: EntryId,
    /// The event this entry was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_event: Option<EventId>,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub height: f64,
    pub head_circumference: f64,
}

/// Growth entries ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthLog {
    entries: Vec<GrowthEntry>,
}

impl GrowthLog {
    /// Builds a log from stored entries, restoring date order.
    pub fn from_entries(mut entries: Vec<GrowthEntry>) -> Self {
        entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Self { entries }
    }

    /// Entries in ascending date order.
    pub fn entries(&self) -> &[GrowthEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry derived from `event_id`, if any.
    pub fn for_event(&self, event_id: &EventId) -> Option<&GrowthEntry> {
        self.entries
            .iter()
            .find(|e| e.source_event.as_ref() == Some(event_id))
    }

    /// Adds an entry that was not derived from an event.
    pub fn record(&mut self, entry: GrowthEntry) {
        self.insert(entry);
    }

    /// Derives an entry for a newly appended event.
    ///
    /// Returns whether an entry was created.
    pub fn on_append(&mut self, event: &CareEvent) -> bool {
        match self.resolve(event, None) {
            Some(entry) => {
                tracing::debug!(event_id = %event.id, entry_id = %entry.id, "derived growth entry");
                self.insert(entry);
                true
            }
            None => false,
        }
    }

    /// Drops the entry derived from a removed event.
    pub fn on_remove(&mut self, event_id: &EventId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.source_event.as_ref() != Some(event_id));
        before != self.entries.len()
    }

    /// Re-resolves the entry for an edited event.
    ///
    /// The existing entry keeps its ID when the new event still yields one;
    /// it is removed when the new event no longer carries measurements.
    pub fn on_replace(&mut self, event: &CareEvent) {
        let existing_id = self.for_event(&event.id).map(|e| e.id.clone());
        self.on_remove(&event.id);
        if let Some(entry) = self.resolve(event, existing_id) {
            self.insert(entry);
        }
    }

    /// Resolves the entry an event would produce, without mutating the log.
    fn resolve(&self, event: &CareEvent, id: Option<EntryId>) -> Option<GrowthEntry> {
        let measurements = event.measurements.as_ref()?;
        if !measurements.any() {
            return None;
        }
        let prior: Vec<&GrowthEntry> = self
            .entries
            .iter()
            .filter(|e| e.date < event.timestamp && e.source_event.as_ref() != Some(&event.id))
            .collect();
        let backfill = |pick: fn(&GrowthEntry) -> f64| {
            prior
                .iter()
                .rev()
                .map(|e| pick(e))
                .find(|v| *v > 0.0)
                .unwrap_or(0.0)
        };

        let weight = positive(measurements.weight).unwrap_or_else(|| backfill(|e| e.weight));
        let height = positive(measurements.height).unwrap_or_else(|| backfill(|e| e.height));
        let head_circumference = positive(measurements.head_circumference)
            .unwrap_or_else(|| backfill(|e| e.head_circumference));

        Some(GrowthEntry {
            id: id.unwrap_or_else(EntryId::generate),
            source_event: Some(event.id.clone()),
            date: event.timestamp,
            weight,
            height,
            head_circumference,
        })
    }

    fn insert(&mut self, entry: GrowthEntry) {
        let index = self.entries.partition_point(|e| e.date <= entry.date);
        self.entries.insert(index, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::category::Category;
    use crate::event::Measurements;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
    }

    fn measured(day: u32, weight: Option<f64>, height: Option<f64>, head: Option<f64>) -> CareEvent {
        CareEvent::new(Category::Growth, at(day), "Checkup")
            .with_measurements(Measurements::new(weight, height, head).unwrap())
    }

    #[test]
    fn append_creates_entry_with_backfill() {
        let mut log = GrowthLog::default();
        log.on_append(&measured(1, Some(5.0), Some(57.0), Some(38.0)));
        log.on_append(&measured(10, Some(5.4), None, None));

        let latest = log.entries().last().unwrap();
        assert!((latest.weight - 5.4).abs() < f64::EPSILON);
        assert!((latest.height - 57.0).abs() < f64::EPSILON);
        assert!((latest.head_circumference - 38.0).abs() < f64::EPSILON);
    }

    #[test]
    fn backfill_skips_zero_values() {
        let mut log = GrowthLog::default();
        log.on_append(&measured(1, Some(5.0), Some(57.0), None));
        log.on_append(&measured(5, Some(5.2), None, Some(38.5)));
        // Day 5 entry has height backfilled to 57.0; day 1 has head 0.0.
        log.on_append(&measured(9, None, Some(58.0), None));

        let latest = log.entries().last().unwrap();
        assert!((latest.weight - 5.2).abs() < f64::EPSILON);
        assert!((latest.head_circumference - 38.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unresolvable_fields_stay_zero() {
        let mut log = GrowthLog::default();
        log.on_append(&measured(1, Some(5.0), None, None));
        let entry = &log.entries()[0];
        assert!(entry.height.abs() < f64::EPSILON);
        assert!(entry.head_circumference.abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_measurements_create_nothing() {
        let mut log = GrowthLog::default();
        assert!(!log.on_append(&measured(1, Some(0.0), None, Some(0.0))));
        assert!(!log.on_append(&CareEvent::new(Category::Feeding, at(1), "Bottle")));
        assert!(log.is_empty());
    }

    #[test]
    fn backfill_only_looks_backwards() {
        let mut log = GrowthLog::default();
        log.on_append(&measured(10, Some(6.0), Some(60.0), Some(40.0)));
        log.on_append(&measured(2, Some(5.0), None, None));

        let earliest = &log.entries()[0];
        assert!((earliest.weight - 5.0).abs() < f64::EPSILON);
        assert!(earliest.height.abs() < f64::EPSILON);
    }

    #[test]
    fn remove_drops_only_the_linked_entry() {
        let mut log = GrowthLog::default();
        let first = measured(1, Some(5.0), None, None);
        // Same minute, different event: must survive the delete.
        let twin = measured(1, Some(5.1), None, None);
        log.on_append(&first);
        log.on_append(&twin);

        assert!(log.on_remove(&first.id));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].source_event.as_ref(), Some(&twin.id));
        assert!(!log.on_remove(&first.id));
    }

    #[test]
    fn replace_keeps_entry_id_and_rebackfills() {
        let mut log = GrowthLog::default();
        log.on_append(&measured(1, Some(5.0), Some(57.0), Some(38.0)));
        let event = measured(5, Some(5.3), None, None);
        log.on_append(&event);
        let original_id = log.for_event(&event.id).unwrap().id.clone();

        let mut edited = event.clone();
        edited.measurements = Some(Measurements::new(None, Some(58.5), None).unwrap());
        log.on_replace(&edited);

        let entry = log.for_event(&event.id).unwrap();
        assert_eq!(entry.id, original_id);
        assert!((entry.weight - 5.0).abs() < f64::EPSILON);
        assert!((entry.height - 58.5).abs() < f64::EPSILON);
    }

    #[test]
    fn replace_without_measurements_removes_entry() {
        let mut log = GrowthLog::default();
        let event = measured(3, Some(5.0), None, None);
        log.on_append(&event);

        let mut edited = event.clone();
        edited.measurements = None;
        log.on_replace(&edited);
        assert!(log.is_empty());
    }

    #[test]
    fn replace_can_create_entry_for_previously_plain_event() {
        let mut log = GrowthLog::default();
        let mut event = CareEvent::new(Category::Feeding, at(3), "Bottle");
        log.on_append(&event);
        assert!(log.is_empty());

        event.measurements = Some(Measurements::new(Some(5.5), None, None).unwrap());
        log.on_replace(&event);
        assert_eq!(log.len(), 1);
    }
}
