//! Append-only, de-duplicating collection of care events.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::category::Category;
use crate::event::CareEvent;
use crate::types::EventId;

/// Event store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An event with this ID is already stored.
    #[error("duplicate event id: {0}")]
    DuplicateId(EventId),
    /// No event with this ID exists.
    #[error("unknown event id: {0}")]
    UnknownEvent(EventId),
    /// A replacement tried to move an event in time.
    #[error("timestamp of event {id} cannot change (was {was}, got {got})")]
    TimestampChanged {
        id: EventId,
        was: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}

/// Iteration direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Oldest first. Used by streak and weekly computations.
    Ascending,
    /// Newest first. Used by history views.
    Descending,
}

/// Events kept in canonical order: ascending timestamp, then ID.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<CareEvent>,
    ids: HashSet<EventId>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from loaded events, skipping repeated IDs.
    pub fn from_events(events: impl IntoIterator<Item = CareEvent>) -> Self {
        let mut store = Self::new();
        for event in events {
            if let Err(err) = store.append(event) {
                tracing::warn!(%err, "dropping event while loading");
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &EventId) -> Option<&CareEvent> {
        self.position(id).map(|i| &self.events[i])
    }

    /// All events in canonical (ascending) order.
    pub fn events(&self) -> &[CareEvent] {
        &self.events
    }

    /// Inserts an event at its canonical position.
    pub fn append(&mut self, event: CareEvent) -> Result<(), StoreError> {
        if self.ids.contains(&event.id) {
            return Err(StoreError::DuplicateId(event.id));
        }
        let index = self.events.partition_point(|e| {
            (e.timestamp, &e.id) <= (event.timestamp, &event.id)
        });
        self.ids.insert(event.id.clone());
        self.events.insert(index, event);
        Ok(())
    }

    /// Removes the event with `id`, returning it if it existed.
    pub fn remove(&mut self, id: &EventId) -> Option<CareEvent> {
        let index = self.position(id)?;
        self.ids.remove(id);
        Some(self.events.remove(index))
    }

    /// Overwrites every field of the event with `id` except the ID itself.
    ///
    /// Returns the previous version.
    pub fn replace(&mut self, id: &EventId, mut event: CareEvent) -> Result<CareEvent, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::UnknownEvent(id.clone()))?;
        let was = self.events[index].timestamp;
        if event.timestamp != was {
            return Err(StoreError::TimestampChanged {
                id: id.clone(),
                was,
                got: event.timestamp,
            });
        }
        event.id = id.clone();
        Ok(std::mem::replace(&mut self.events[index], event))
    }

    /// Lazily yields events matching `predicate` in the requested order.
    ///
    /// The returned iterator is `Clone`, so a caller can restart it.
    pub fn query<'a, P>(
        &'a self,
        order: Order,
        predicate: P,
    ) -> impl Iterator<Item = &'a CareEvent> + Clone + 'a
    where
        P: Fn(&CareEvent) -> bool + Clone + 'a,
    {
        Ordered {
            inner: self.events.iter(),
            order,
        }
        .filter(move |e| predicate(e))
    }

    /// Most recent event in `category`.
    pub fn latest(&self, category: Category) -> Option<&CareEvent> {
        self.events.iter().rev().find(|e| e.category == category)
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        if !self.ids.contains(id) {
            return None;
        }
        self.events.iter().position(|e| &e.id == id)
    }
}

#[derive(Debug, Clone)]
struct Ordered<'a> {
    inner: std::slice::Iter<'a, CareEvent>,
    order: Order,
}

impl<'a> Iterator for Ordered<'a> {
    type Item = &'a CareEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            Order::Ascending => self.inner.next(),
            Order::Descending => self.inner.next_back(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn event(id: &str, category: Category, hour: u32) -> CareEvent {
        CareEvent::new(category, at(hour), "x").with_id(EventId::new(id).unwrap())
    }

    #[test]
    fn append_keeps_timestamp_order() {
        let mut store = EventStore::new();
        store.append(event("c", Category::Diaper, 9)).unwrap();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        store.append(event("b", Category::Sleep, 8)).unwrap();

        let ids: Vec<_> = store.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn append_rejects_duplicate_ids() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        let err = store.append(event("a", Category::Diaper, 8)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(EventId::new("a").unwrap()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        assert!(store.remove(&EventId::new("zzz").unwrap()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removed_id_can_be_checked() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        let id = EventId::new("a").unwrap();
        assert!(store.remove(&id).is_some());
        assert!(!store.contains(&id));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn replace_preserves_id_and_rejects_time_travel() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        let id = EventId::new("a").unwrap();

        let edited = event("other", Category::Feeding, 7).with_note("left side");
        let previous = store.replace(&id, edited).unwrap();
        assert!(previous.note.is_none());
        let current = store.get(&id).unwrap();
        assert_eq!(current.id, id);
        assert_eq!(current.note.as_deref(), Some("left side"));

        let moved = event("a", Category::Feeding, 8);
        assert!(matches!(
            store.replace(&id, moved),
            Err(StoreError::TimestampChanged { .. })
        ));
    }

    #[test]
    fn replace_unknown_errors() {
        let mut store = EventStore::new();
        let id = EventId::new("nope").unwrap();
        let err = store.replace(&id, event("nope", Category::Sleep, 1)).unwrap_err();
        assert_eq!(err, StoreError::UnknownEvent(id));
    }

    #[test]
    fn query_filters_and_orders() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        store.append(event("b", Category::Sleep, 8)).unwrap();
        store.append(event("c", Category::Feeding, 9)).unwrap();

        let feeds = store.query(Order::Descending, |e| e.category == Category::Feeding);
        let ids: Vec<_> = feeds.clone().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "a"]);

        // Restartable: the clone above did not consume the original.
        assert_eq!(feeds.count(), 2);

        let asc: Vec<_> = store
            .query(Order::Ascending, |_| true)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(asc, ["a", "b", "c"]);
    }

    #[test]
    fn latest_finds_most_recent_of_category() {
        let mut store = EventStore::new();
        store.append(event("a", Category::Feeding, 7)).unwrap();
        store.append(event("b", Category::Feeding, 10)).unwrap();
        store.append(event("c", Category::Diaper, 11)).unwrap();
        assert_eq!(store.latest(Category::Feeding).unwrap().id.as_str(), "b");
        assert!(store.latest(Category::Pumping).is_none());
    }

    #[test]
    fn from_events_skips_repeated_ids() {
        let store = EventStore::from_events([
            event("a", Category::Feeding, 7),
            event("a", Category::Diaper, 8),
        ]);
        assert_eq!(store.len(), 1);
    }
}
