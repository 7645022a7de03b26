//! The persistence boundary: everything needed to restore a tracker.
//!
//! Decoding is lenient. A record that fails to decode is dropped with a
//! warning instead of failing the whole load; only a document that is not
//! a JSON object at all is an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::event::CareEvent;
use crate::growth::GrowthEntry;
use crate::milestone::Milestone;
use crate::profile::SubjectProfile;
use crate::vocabulary::Word;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Ordered lists of every persisted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub events: Vec<CareEvent>,
    pub growth: Vec<GrowthEntry>,
    pub milestones: Vec<Milestone>,
    pub words: Vec<Word>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<SubjectProfile>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    events: Vec<Box<RawValue>>,
    #[serde(default)]
    growth: Vec<Box<RawValue>>,
    #[serde(default)]
    milestones: Vec<Box<RawValue>>,
    #[serde(default)]
    words: Vec<Box<RawValue>>,
    #[serde(default)]
    profile: Option<Box<RawValue>>,
}

const fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    /// Decodes a snapshot, dropping records that fail to decode.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        if raw.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(raw.version));
        }
        let profile = raw.profile.and_then(|value| {
            if value.get() == "null" {
                return None;
            }
            decode_record::<SubjectProfile>("profile", value.get())
        });
        Ok(Self {
            version: SNAPSHOT_VERSION,
            events: decode_each("event", &raw.events),
            growth: decode_each("growth entry", &raw.growth),
            milestones: decode_each("milestone", &raw.milestones),
            words: decode_each("word", &raw.words),
            profile,
        })
    }

    /// Encodes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Decodes one record, logging and discarding it on failure.
pub fn decode_record<T: DeserializeOwned>(kind: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(kind, %err, "dropping corrupt record");
            None
        }
    }
}

fn decode_each<T: DeserializeOwned>(kind: &str, values: &[Box<RawValue>]) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| decode_record(kind, value.get()))
        .collect()
}
