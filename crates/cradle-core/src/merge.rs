//! Content-based combining of two independently collected event histories.
//!
//! IDs generated on different devices cannot be trusted to match, so a
//! remote event is considered a copy of a local one when category, label
//! and mood agree and the timestamps are within [`DUPLICATE_WINDOW_SECS`].
//! This can occasionally merge two genuinely distinct events logged at
//! nearly the same time, or keep two copies of one event logged with
//! different wording.

use serde::{Deserialize, Serialize};

use crate::event::CareEvent;

/// Maximum timestamp distance for two events to count as the same fact.
pub const DUPLICATE_WINDOW_SECS: i64 = 60;

/// Whether `remote` describes the same fact as `local`.
pub fn is_duplicate(local: &CareEvent, remote: &CareEvent) -> bool {
    local.category == remote.category
        && local.label == remote.label
        && local.mood == remote.mood
        && (local.timestamp - remote.timestamp).num_seconds().abs() <= DUPLICATE_WINDOW_SECS
}

/// Remote events that are not copies of anything in `local`.
///
/// Each remote event is only compared against `local`, never against other
/// remote events.
pub fn novel<'a>(local: &'a [CareEvent], remote: &'a [CareEvent]) -> impl Iterator<Item = &'a CareEvent> {
    remote
        .iter()
        .filter(move |r| !local.iter().any(|l| is_duplicate(l, r)))
}

/// Merges `remote` into `local`, newest first.
pub fn merge(local: &[CareEvent], remote: &[CareEvent]) -> Vec<CareEvent> {
    let mut merged: Vec<CareEvent> = local
        .iter()
        .chain(novel(local, remote))
        .cloned()
        .collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    merged
}

/// Outcome of merging a remote batch into a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Remote events appended.
    pub added: usize,
    /// Remote events discarded as copies of known events.
    pub duplicates: usize,
}

impl MergeReport {
    pub const fn is_noop(&self) -> bool {
        self.added == 0
    }
}
