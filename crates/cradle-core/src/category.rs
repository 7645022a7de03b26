//! Care event category as the single source of truth for category strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of care fact an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Feeding,
    Pumping,
    Diaper,
    Sleep,
    Milestone,
    /// Free-form activity such as tummy time, bath or play.
    Activity,
    Growth,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 7] = [
        Self::Feeding,
        Self::Pumping,
        Self::Diaper,
        Self::Sleep,
        Self::Milestone,
        Self::Activity,
        Self::Growth,
    ];

    /// String representation for storage and the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::Pumping => "pumping",
            Self::Diaper => "diaper",
            Self::Sleep => "sleep",
            Self::Milestone => "milestone",
            Self::Activity => "activity",
            Self::Growth => "growth",
        }
    }

    /// Whether a `duration` is meaningful for this category.
    #[must_use]
    pub const fn is_timed(&self) -> bool {
        matches!(self, Self::Sleep | Self::Activity)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feeding" | "feed" => Ok(Self::Feeding),
            "pumping" | "pump" => Ok(Self::Pumping),
            "diaper" => Ok(Self::Diaper),
            "sleep" | "nap" => Ok(Self::Sleep),
            "milestone" => Ok(Self::Milestone),
            "activity" => Ok(Self::Activity),
            "growth" => Ok(Self::Growth),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown category strings.
#[derive(Debug, Clone)]
pub struct UnknownCategory(String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}
