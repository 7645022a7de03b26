//! Subject profile: the singleton configuration every derivation reads.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const KG_TO_LB: f64 = 2.204_622_621_8;
const CM_TO_IN: f64 = 0.393_700_787_4;

/// The child being tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub name: String,
    pub birth_date: NaiveDate,
    /// Selects sex-specific reference curves when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default)]
    pub goals: WeeklyGoals,
}

impl SubjectProfile {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth_date,
            sex: None,
            units: UnitSystem::default(),
            goals: WeeklyGoals::default(),
        }
    }

    /// Age in completed months on `date`.
    pub fn age_in_months(&self, date: NaiveDate) -> u32 {
        months_between(self.birth_date, date)
    }

    /// Age in completed weeks on `date`.
    pub fn age_in_weeks(&self, date: NaiveDate) -> u32 {
        let days = (date - self.birth_date).num_days().max(0);
        u32::try_from(days / 7).unwrap_or(u32::MAX)
    }
}

/// Completed calendar months from `from` to `to`, zero if `to` precedes `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    u32::try_from(months.max(0)).unwrap_or(0)
}

/// Biological sex used to pick reference curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" => Ok(Self::Male),
            "female" | "f" | "girl" => Ok(Self::Female),
            other => Err(format!("unknown sex: {other}")),
        }
    }
}

/// Display unit preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Formats a weight given in kilograms.
    pub fn format_weight(self, kg: f64) -> String {
        match self {
            Self::Metric => format!("{kg:.2} kg"),
            Self::Imperial => format!("{:.2} lb", kg * KG_TO_LB),
        }
    }

    /// Formats a length given in centimetres.
    pub fn format_length(self, cm: f64) -> String {
        match self {
            Self::Metric => format!("{cm:.1} cm"),
            Self::Imperial => format!("{:.1} in", cm * CM_TO_IN),
        }
    }

    /// Converts a weight entered in this unit system to kilograms.
    pub fn weight_to_kg(self, value: f64) -> f64 {
        match self {
            Self::Metric => value,
            Self::Imperial => value / KG_TO_LB,
        }
    }

    /// Converts a length entered in this unit system to centimetres.
    pub fn length_to_cm(self, value: f64) -> f64 {
        match self {
            Self::Metric => value,
            Self::Imperial => value / CM_TO_IN,
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(format!("unknown unit system: {other}")),
        }
    }
}

/// Configurable weekly targets used for progress ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoals {
    pub feedings: u32,
    pub sleep_hours: f64,
    pub diapers: u32,
    pub tummy_minutes: u32,
}

impl Default for WeeklyGoals {
    fn default() -> Self {
        Self {
            feedings: 56,
            sleep_hours: 98.0,
            diapers: 42,
            tummy_minutes: 210,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn months_between_counts_completed_months() {
        assert_eq!(months_between(date(2025, 1, 15), date(2025, 3, 14)), 1);
        assert_eq!(months_between(date(2025, 1, 15), date(2025, 3, 15)), 2);
        assert_eq!(months_between(date(2024, 11, 30), date(2025, 2, 1)), 2);
    }

    #[test]
    fn months_between_is_zero_before_birth() {
        assert_eq!(months_between(date(2025, 5, 1), date(2025, 4, 1)), 0);
    }

    #[test]
    fn age_in_weeks_floors() {
        let profile = SubjectProfile::new("Ada", date(2025, 1, 1));
        assert_eq!(profile.age_in_weeks(date(2025, 1, 14)), 1);
        assert_eq!(profile.age_in_weeks(date(2025, 1, 15)), 2);
        assert_eq!(profile.age_in_weeks(date(2024, 12, 1)), 0);
    }

    #[test]
    fn imperial_formatting_converts_units() {
        assert_eq!(UnitSystem::Imperial.format_weight(5.0), "11.02 lb");
        assert_eq!(UnitSystem::Imperial.format_length(50.0), "19.7 in");
        assert_eq!(UnitSystem::Metric.format_weight(5.0), "5.00 kg");
    }

    #[test]
    fn imperial_input_converts_back_to_metric() {
        let kg = UnitSystem::Imperial.weight_to_kg(11.023_113_109);
        assert!((kg - 5.0).abs() < 1e-6);
    }

    #[test]
    fn profile_defaults_fill_missing_fields() {
        let json = r#"{"name":"Ada","birth_date":"2025-01-01"}"#;
        let profile: SubjectProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.units, UnitSystem::Metric);
        assert_eq!(profile.goals, WeeklyGoals::default());
        assert!(profile.sex.is_none());
    }
}
