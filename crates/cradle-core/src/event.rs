//! Logged care events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::types::{EventId, ValidationError};

/// A single timestamped fact about the subject.
///
/// Events are immutable facts: `timestamp` is when the event happened (not
/// when it was recorded) and never changes once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareEvent {
    pub id: EventId,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    #[serde(default)]
    pub mood: Mood,
    /// Minutes. Meaningful for sleep and activity events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Measurements>,
}

impl CareEvent {
    /// Creates an event with a fresh ID and default mood.
    pub fn new(category: Category, timestamp: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self {
            id: EventId::generate(),
            category,
            timestamp,
            label: label.into(),
            mood: Mood::default(),
            duration: None,
            note: None,
            measurements: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub const fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub const fn with_measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = Some(measurements);
        self
    }

    /// Duration in minutes, treating an absent duration as zero.
    pub fn minutes(&self) -> u32 {
        self.duration.unwrap_or(0)
    }

    /// Whether this event carries at least one usable measurement.
    pub fn has_measurements(&self) -> bool {
        self.measurements.as_ref().is_some_and(Measurements::any)
    }
}

/// Subjective state tagged on an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Sleepy,
    Fussy,
    Upset,
}

impl Mood {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Sleepy => "sleepy",
            Self::Fussy => "fussy",
            Self::Upset => "upset",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "neutral" => Ok(Self::Neutral),
            "sleepy" => Ok(Self::Sleepy),
            "fussy" => Ok(Self::Fussy),
            "upset" => Ok(Self::Upset),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

/// Growth measurements attached to an event.
///
/// Weight in kilograms, height and head circumference in centimetres.
/// A zero value is treated the same as an absent one.
/// Decoding applies the same checks as [`Measurements::new`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeasurementFields")]
pub struct Measurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_circumference: Option<f64>,
}

#[derive(Deserialize)]
struct MeasurementFields {
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    head_circumference: Option<f64>,
}

impl TryFrom<MeasurementFields> for Measurements {
    type Error = ValidationError;

    fn try_from(fields: MeasurementFields) -> Result<Self, Self::Error> {
        Self::new(fields.weight, fields.height, fields.head_circumference)
    }
}

impl Measurements {
    /// Builds measurements, rejecting negative or non-finite values.
    pub fn new(
        weight: Option<f64>,
        height: Option<f64>,
        head_circumference: Option<f64>,
    ) -> Result<Self, ValidationError> {
        check_measurement("weight", weight)?;
        check_measurement("height", height)?;
        check_measurement("head circumference", head_circumference)?;
        Ok(Self {
            weight,
            height,
            head_circumference,
        })
    }

    /// Whether any field holds a strictly positive value.
    pub fn any(&self) -> bool {
        [self.weight, self.height, self.head_circumference]
            .into_iter()
            .any(|v| positive(v).is_some())
    }
}

fn check_measurement(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(ValidationError::InvalidMeasurement { field, value: v })
        }
        _ => Ok(()),
    }
}

/// Returns the value only when it is strictly positive.
pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}
