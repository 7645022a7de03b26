//! Developmental milestones: a static catalog plus user records.
//!
//! Predefined milestones live in [`CATALOG`] and are only persisted once
//! they are completed. User-authored milestones are always persisted. The
//! [`MilestoneBook`] merges both views at query time.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MilestoneId;

/// Milestone book errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MilestoneError {
    #[error("unknown milestone: {0}")]
    Unknown(MilestoneId),

    #[error("milestone {0} is predefined and cannot be removed")]
    Predefined(MilestoneId),

    #[error("milestone title cannot be empty")]
    EmptyTitle,

    #[error("invalid age window: {min} to {max} weeks")]
    InvalidWindow { min: u32, max: u32 },
}

/// Developmental area a milestone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneCategory {
    Motor,
    Social,
    Language,
    Cognitive,
}

impl MilestoneCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Motor => "motor",
            Self::Social => "social",
            Self::Language => "language",
            Self::Cognitive => "cognitive",
        }
    }
}

impl fmt::Display for MilestoneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MilestoneCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motor" => Ok(Self::Motor),
            "social" => Ok(Self::Social),
            "language" => Ok(Self::Language),
            "cognitive" => Ok(Self::Cognitive),
            other => Err(format!("unknown milestone category: {other}")),
        }
    }
}

/// A milestone, either from the catalog or user-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    /// Start of the expected window, inclusive.
    pub min_age_weeks: u32,
    /// End of the expected window, inclusive.
    pub max_age_weeks: u32,
    pub category: MilestoneCategory,
    #[serde(default)]
    pub description: String,
    pub is_predefined: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
}

impl Milestone {
    /// Whether `age_weeks` falls inside the expected window.
    pub const fn expected_at(&self, age_weeks: u32) -> bool {
        self.min_age_weeks <= age_weeks && age_weeks <= self.max_age_weeks
    }
}

/// A read-only catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct PredefinedMilestone {
    pub id: &'static str,
    pub title: &'static str,
    pub min_age_weeks: u32,
    pub max_age_weeks: u32,
    pub category: MilestoneCategory,
    pub description: &'static str,
}

impl PredefinedMilestone {
    fn to_milestone(self) -> Option<Milestone> {
        Some(Milestone {
            id: MilestoneId::new(self.id).ok()?,
            title: self.title.to_string(),
            min_age_weeks: self.min_age_weeks,
            max_age_weeks: self.max_age_weeks,
            category: self.category,
            description: self.description.to_string(),
            is_predefined: true,
            is_completed: false,
            completed_date: None,
        })
    }
}

const fn pre(
    id: &'static str,
    title: &'static str,
    min_age_weeks: u32,
    max_age_weeks: u32,
    category: MilestoneCategory,
    description: &'static str,
) -> PredefinedMilestone {
    PredefinedMilestone {
        id,
        title,
        min_age_weeks,
        max_age_weeks,
        category,
        description,
    }
}

/// Built-in milestones, ordered by expected window.
#[rustfmt::skip]
pub static CATALOG: &[PredefinedMilestone] = &[
    pre("pre-social-smile", "Social smile", 6, 8, MilestoneCategory::Social, "Smiles back when smiled at."),
    pre("pre-coos", "Coos", 6, 12, MilestoneCategory::Language, "Makes soft vowel sounds."),
    pre("pre-head-up", "Holds head up", 8, 16, MilestoneCategory::Motor, "Lifts head during tummy time."),
    pre("pre-tracks", "Tracks objects", 8, 12, MilestoneCategory::Cognitive, "Follows a moving toy with the eyes."),
    pre("pre-laughs", "Laughs", 12, 20, MilestoneCategory::Social, "Laughs out loud."),
    pre("pre-reaches", "Reaches for toys", 12, 20, MilestoneCategory::Motor, "Reaches for and grabs objects."),
    pre("pre-rolls-over", "Rolls over", 16, 26, MilestoneCategory::Motor, "Rolls from tummy to back."),
    pre("pre-babbles", "Babbles", 16, 28, MilestoneCategory::Language, "Strings consonant sounds together."),
    pre("pre-sits", "Sits without support", 24, 36, MilestoneCategory::Motor, "Sits upright unassisted."),
    pre("pre-crawls", "Crawls", 28, 44, MilestoneCategory::Motor, "Moves on hands and knees."),
    pre("pre-object-permanence", "Looks for hidden objects", 32, 44, MilestoneCategory::Cognitive, "Searches for a toy hidden under a cloth."),
    pre("pre-pulls-to-stand", "Pulls to stand", 36, 48, MilestoneCategory::Motor, "Pulls up on furniture."),
    pre("pre-waves", "Waves bye-bye", 36, 52, MilestoneCategory::Social, "Waves when someone leaves."),
    pre("pre-first-word", "First word", 40, 56, MilestoneCategory::Language, "Says a word with meaning."),
    pre("pre-first-steps", "First steps", 44, 64, MilestoneCategory::Motor, "Takes a few steps alone."),
];

fn catalog_entry(id: &MilestoneId) -> Option<&'static PredefinedMilestone> {
    CATALOG.iter().find(|m| m.id == id.as_str())
}

/// Persisted milestone records merged with the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneBook {
    records: Vec<Milestone>,
}

impl MilestoneBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a book from persisted records, dropping repeated IDs.
    pub fn from_records(records: impl IntoIterator<Item = Milestone>) -> Self {
        let mut book = Self::new();
        for record in records {
            if book.record(&record.id).is_some() {
                tracing::warn!(id = %record.id, "dropping repeated milestone record");
                continue;
            }
            book.records.push(record);
        }
        book
    }

    /// Only the records that need persisting.
    pub fn records(&self) -> &[Milestone] {
        &self.records
    }

    /// Catalog and user milestones merged, ordered by window start then title.
    pub fn all(&self) -> Vec<Milestone> {
        let mut merged: Vec<Milestone> = CATALOG
            .iter()
            .filter_map(|entry| entry.to_milestone())
            .filter(|m| self.record(&m.id).is_none())
            .chain(self.records.iter().cloned())
            .collect();
        merged.sort_by(|a, b| {
            a.min_age_weeks
                .cmp(&b.min_age_weeks)
                .then_with(|| a.title.cmp(&b.title))
        });
        merged
    }

    pub fn get(&self, id: &MilestoneId) -> Option<Milestone> {
        self.record(id)
            .cloned()
            .or_else(|| catalog_entry(id).and_then(|entry| entry.to_milestone()))
    }

    /// Marks a milestone completed on `date`, persisting catalog entries.
    pub fn complete(&mut self, id: &MilestoneId, date: NaiveDate) -> Result<(), MilestoneError> {
        if self.record(id).is_none() {
            let milestone = catalog_entry(id)
                .and_then(|entry| entry.to_milestone())
                .ok_or_else(|| MilestoneError::Unknown(id.clone()))?;
            self.records.push(milestone);
        }
        let record = self
            .record_mut(id)
            .ok_or_else(|| MilestoneError::Unknown(id.clone()))?;
        record.is_completed = true;
        record.completed_date = Some(date);
        tracing::debug!(%id, %date, "milestone completed");
        Ok(())
    }

    /// Clears completion. A catalog entry goes back to being unpersisted.
    pub fn uncomplete(&mut self, id: &MilestoneId) -> Result<(), MilestoneError> {
        let Some(index) = self.records.iter().position(|m| &m.id == id) else {
            // An unpersisted catalog entry is already incomplete.
            return match catalog_entry(id) {
                Some(_) => Ok(()),
                None => Err(MilestoneError::Unknown(id.clone())),
            };
        };
        if self.records[index].is_predefined {
            self.records.remove(index);
        } else {
            let record = &mut self.records[index];
            record.is_completed = false;
            record.completed_date = None;
        }
        Ok(())
    }

    /// Adds a user-authored milestone and returns its ID.
    pub fn add_custom(
        &mut self,
        title: impl Into<String>,
        min_age_weeks: u32,
        max_age_weeks: u32,
        category: MilestoneCategory,
        description: impl Into<String>,
    ) -> Result<MilestoneId, MilestoneError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(MilestoneError::EmptyTitle);
        }
        if min_age_weeks > max_age_weeks {
            return Err(MilestoneError::InvalidWindow {
                min: min_age_weeks,
                max: max_age_weeks,
            });
        }
        let id = MilestoneId::generate();
        self.records.push(Milestone {
            id: id.clone(),
            title,
            min_age_weeks,
            max_age_weeks,
            category,
            description: description.into(),
            is_predefined: false,
            is_completed: false,
            completed_date: None,
        });
        Ok(id)
    }

    /// Deletes a user-authored milestone.
    pub fn remove_custom(&mut self, id: &MilestoneId) -> Result<Milestone, MilestoneError> {
        if catalog_entry(id).is_some() {
            return Err(MilestoneError::Predefined(id.clone()));
        }
        let index = self
            .records
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| MilestoneError::Unknown(id.clone()))?;
        Ok(self.records.remove(index))
    }

    /// Milestones whose expected window contains `age_weeks`.
    pub fn window_for_age(&self, age_weeks: u32) -> Vec<Milestone> {
        self.all()
            .into_iter()
            .filter(|m| m.expected_at(age_weeks))
            .collect()
    }

    /// The incomplete milestone with the earliest window start.
    pub fn next_incomplete(&self) -> Option<Milestone> {
        self.all().into_iter().find(|m| !m.is_completed)
    }

    /// Fraction of all known milestones that are completed.
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_ratio(&self) -> f64 {
        let all = self.all();
        if all.is_empty() {
            return 0.0;
        }
        let done = all.iter().filter(|m| m.is_completed).count();
        done as f64 / all.len() as f64
    }

    fn record(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.records.iter().find(|m| &m.id == id)
    }

    fn record_mut(&mut self, id: &MilestoneId) -> Option<&mut Milestone> {
        self.records.iter_mut().find(|m| &m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> MilestoneId {
        MilestoneId::new(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn catalog_ids_are_prefixed_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in CATALOG {
            assert!(entry.id.starts_with("pre-"), "{}", entry.id);
            assert!(entry.min_age_weeks <= entry.max_age_weeks, "{}", entry.id);
            assert!(seen.insert(entry.id), "repeated {}", entry.id);
        }
    }

    #[test]
    fn fresh_book_lists_catalog_without_persisting() {
        let book = MilestoneBook::new();
        assert_eq!(book.all().len(), CATALOG.len());
        assert!(book.records().is_empty());
        assert!(book.all().iter().all(|m| m.is_predefined && !m.is_completed));
    }

    #[test]
    fn completing_catalog_entry_persists_it() {
        let mut book = MilestoneBook::new();
        book.complete(&id("pre-rolls-over"), day(4)).unwrap();

        assert_eq!(book.records().len(), 1);
        let rolled = book.get(&id("pre-rolls-over")).unwrap();
        assert!(rolled.is_completed);
        assert_eq!(rolled.completed_date, Some(day(4)));
        // Still one merged entry per milestone.
        assert_eq!(book.all().len(), CATALOG.len());
    }

    #[test]
    fn uncompleting_catalog_entry_unpersists_it() {
        let mut book = MilestoneBook::new();
        book.complete(&id("pre-coos"), day(4)).unwrap();
        book.uncomplete(&id("pre-coos")).unwrap();
        assert!(book.records().is_empty());
        assert!(!book.get(&id("pre-coos")).unwrap().is_completed);
        // Uncompleting an untouched catalog entry is fine.
        book.uncomplete(&id("pre-laughs")).unwrap();
    }

    #[test]
    fn custom_milestones_round_trip() {
        let mut book = MilestoneBook::new();
        let custom = book
            .add_custom("Splashes in bath", 20, 30, MilestoneCategory::Motor, "")
            .unwrap();
        assert_eq!(book.all().len(), CATALOG.len() + 1);

        book.complete(&custom, day(9)).unwrap();
        book.uncomplete(&custom).unwrap();
        // Custom records stay persisted after uncompleting.
        assert_eq!(book.records().len(), 1);

        let removed = book.remove_custom(&custom).unwrap();
        assert_eq!(removed.title, "Splashes in bath");
        assert!(book.records().is_empty());
    }

    #[test]
    fn custom_validation() {
        let mut book = MilestoneBook::new();
        assert_eq!(
            book.add_custom("  ", 1, 2, MilestoneCategory::Social, ""),
            Err(MilestoneError::EmptyTitle)
        );
        assert_eq!(
            book.add_custom("Backwards", 10, 2, MilestoneCategory::Social, ""),
            Err(MilestoneError::InvalidWindow { min: 10, max: 2 })
        );
    }

    #[test]
    fn predefined_cannot_be_removed_and_unknown_errors() {
        let mut book = MilestoneBook::new();
        assert_eq!(
            book.remove_custom(&id("pre-crawls")),
            Err(MilestoneError::Predefined(id("pre-crawls")))
        );
        assert_eq!(
            book.complete(&id("nope"), day(1)),
            Err(MilestoneError::Unknown(id("nope")))
        );
        assert_eq!(
            book.uncomplete(&id("nope")),
            Err(MilestoneError::Unknown(id("nope")))
        );
    }

    #[test]
    fn window_for_age_is_inclusive() {
        let book = MilestoneBook::new();
        let titles: Vec<_> = book.window_for_age(8).into_iter().map(|m| m.title).collect();
        assert!(titles.contains(&"Social smile".to_string()));
        assert!(titles.contains(&"Holds head up".to_string()));
        assert!(!titles.contains(&"Laughs".to_string()));
    }

    #[test]
    fn next_incomplete_and_ratio() {
        let mut book = MilestoneBook::new();
        assert_eq!(book.next_incomplete().unwrap().title, "Coos");
        assert!(book.completion_ratio().abs() < f64::EPSILON);

        book.complete(&id("pre-coos"), day(1)).unwrap();
        book.complete(&id("pre-social-smile"), day(1)).unwrap();
        assert_eq!(book.next_incomplete().unwrap().title, "Holds head up");
        #[allow(clippy::cast_precision_loss)]
        let expected = 2.0 / CATALOG.len() as f64;
        assert!((book.completion_ratio() - expected).abs() < 1e-12);
    }

    #[test]
    fn from_records_drops_repeats() {
        let mut book = MilestoneBook::new();
        book.complete(&id("pre-sits"), day(2)).unwrap();
        let record = book.records()[0].clone();
        let restored = MilestoneBook::from_records([record.clone(), record]);
        assert_eq!(restored.records().len(), 1);
    }
}
