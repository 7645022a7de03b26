//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A measurement was negative or not finite.
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Generates a fresh random ID.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated care event identifier.
    ///
    /// Assigned once at creation and never reused. This is the only identity
    /// key for deduplication and for update/delete addressing.
    EventId, "event ID"
);

define_string_id!(
    /// A validated growth entry identifier.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated milestone identifier.
    ///
    /// Predefined catalog milestones use stable `pre-` prefixed IDs.
    MilestoneId, "milestone ID"
);

define_string_id!(
    /// A validated vocabulary word identifier.
    WordId, "word ID"
);

/// How much weight an insight deserves, kept within \[0.0, 1.0\].
///
/// Serialized as a bare number. Decoding clamps instead of rejecting.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Confidence(f32);

impl Confidence {
    /// Clamps `value` into range. NaN becomes 0.0.
    #[must_use]
    pub const fn clamped(value: f32) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else if value > 1.0 {
            Self(1.0)
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl From<f32> for Confidence {
    fn from(value: f32) -> Self {
        Self::clamped(value)
    }
}

impl From<Confidence> for f32 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_rejects_empty() {
        assert!(EventId::new("").is_err());
        assert!(EventId::new("   ").is_err());
        assert!(EventId::new("valid-id").is_ok());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = EventId::generate();
        let b = EventId::generate();
        assert_ne!(a, b);
        Uuid::parse_str(a.as_str()).unwrap();
    }

    #[test]
    fn event_id_serde_roundtrip() {
        let id = EventId::new("feed-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"feed-1\"");
        let parsed: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn word_id_serde_rejects_empty() {
        let result: Result<WordId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "clamping yields exact bounds")]
    fn confidence_clamps_out_of_range_values() {
        assert_eq!(Confidence::clamped(-1.0).value(), 0.0);
        assert_eq!(Confidence::clamped(2.0).value(), 1.0);
        assert_eq!(Confidence::clamped(f32::NAN).value(), 0.0);
        assert_eq!(Confidence::clamped(0.85).to_string(), "0.85");
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "clamping yields exact bounds")]
    fn confidence_is_a_bare_number_on_the_wire() {
        assert_eq!(serde_json::to_string(&Confidence::clamped(0.5)).unwrap(), "0.5");
        let parsed: Confidence = serde_json::from_str("1.5").unwrap();
        assert_eq!(parsed.value(), 1.0);
    }
}
