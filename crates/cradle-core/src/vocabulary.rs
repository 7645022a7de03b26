//! Words the child has said, kept in the order they were first said.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::WordId;

/// Vocabulary errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("word cannot be empty")]
    Empty,

    #[error("word already recorded: {0}")]
    Duplicate(String),

    #[error("unknown word id: {0}")]
    Unknown(WordId),
}

/// Semantic class of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
    People,
    Food,
    Animals,
    Objects,
    Actions,
    Social,
    #[default]
    Other,
}

impl WordCategory {
    pub const ALL: [Self; 7] = [
        Self::People,
        Self::Food,
        Self::Animals,
        Self::Objects,
        Self::Actions,
        Self::Social,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Food => "food",
            Self::Animals => "animals",
            Self::Objects => "objects",
            Self::Actions => "actions",
            Self::Social => "social",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for WordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WordCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown word category: {lower}"))
    }
}

/// A vocabulary word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub word: String,
    #[serde(default)]
    pub category: WordCategory,
    pub date_first_said: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Words unique by case-insensitive spelling, ordered by `date_first_said`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<Word>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a vocabulary, dropping words whose spelling repeats.
    pub fn from_words(words: impl IntoIterator<Item = Word>) -> Self {
        let mut vocabulary = Self::new();
        for word in words {
            if let Err(err) = vocabulary.insert(word) {
                tracing::warn!(%err, "dropping word while loading");
            }
        }
        vocabulary
    }

    /// Words in chronological order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, id: &WordId) -> Option<&Word> {
        self.words.iter().find(|w| &w.id == id)
    }

    /// Looks a word up by spelling, ignoring case.
    pub fn find(&self, word: &str) -> Option<&Word> {
        let key = normalize(word);
        self.words.iter().find(|w| normalize(&w.word) == key)
    }

    /// Records a new word and returns its ID.
    pub fn add(
        &mut self,
        word: &str,
        category: WordCategory,
        date_first_said: NaiveDate,
        notes: Option<String>,
    ) -> Result<WordId, VocabularyError> {
        let id = WordId::generate();
        self.insert(Word {
            id: id.clone(),
            word: word.trim().to_string(),
            category,
            date_first_said,
            notes,
        })?;
        Ok(id)
    }

    /// Applies `edit` to a word, keeping its ID.
    ///
    /// The edit is discarded if it would empty the word or collide with
    /// another spelling.
    pub fn update<F>(&mut self, id: &WordId, edit: F) -> Result<(), VocabularyError>
    where
        F: FnOnce(&mut Word),
    {
        let index = self
            .words
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| VocabularyError::Unknown(id.clone()))?;
        let original = self.words.remove(index);
        let mut edited = original.clone();
        edit(&mut edited);
        edited.id = original.id.clone();
        edited.word = edited.word.trim().to_string();

        if let Err(err) = self.insert(edited) {
            self.words.insert(index, original);
            return Err(err);
        }
        Ok(())
    }

    /// Deletes a word, returning it if it existed.
    pub fn remove(&mut self, id: &WordId) -> Option<Word> {
        let index = self.words.iter().position(|w| &w.id == id)?;
        Some(self.words.remove(index))
    }

    /// Number of words per category. Categories without words are omitted.
    pub fn counts_by_category(&self) -> BTreeMap<WordCategory, usize> {
        let mut counts = BTreeMap::new();
        for word in &self.words {
            *counts.entry(word.category).or_insert(0) += 1;
        }
        counts
    }

    fn insert(&mut self, word: Word) -> Result<(), VocabularyError> {
        if word.word.trim().is_empty() {
            return Err(VocabularyError::Empty);
        }
        if self.find(&word.word).is_some() {
            return Err(VocabularyError::Duplicate(word.word));
        }
        if self.get(&word.id).is_some() {
            return Err(VocabularyError::Duplicate(word.id.to_string()));
        }
        let index = self
            .words
            .partition_point(|w| w.date_first_said <= word.date_first_said);
        self.words.insert(index, word);
        Ok(())
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn words_are_unique_ignoring_case() {
        let mut vocab = Vocabulary::new();
        vocab.add("Mama", WordCategory::People, day(1), None).unwrap();
        let err = vocab.add(" mama ", WordCategory::People, day(2), None).unwrap_err();
        assert_eq!(err, VocabularyError::Duplicate("mama".to_string()));
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn empty_word_rejected() {
        let mut vocab = Vocabulary::new();
        assert_eq!(
            vocab.add("   ", WordCategory::Other, day(1), None),
            Err(VocabularyError::Empty)
        );
    }

    #[test]
    fn listing_is_chronological() {
        let mut vocab = Vocabulary::new();
        vocab.add("dog", WordCategory::Animals, day(10), None).unwrap();
        vocab.add("mama", WordCategory::People, day(1), None).unwrap();
        vocab.add("ball", WordCategory::Objects, day(10), None).unwrap();
        vocab.add("dada", WordCategory::People, day(3), None).unwrap();

        let order: Vec<_> = vocab.words().iter().map(|w| w.word.as_str()).collect();
        assert_eq!(order, ["mama", "dada", "dog", "ball"]);
    }

    #[test]
    fn update_keeps_id_and_reorders() {
        let mut vocab = Vocabulary::new();
        let id = vocab.add("banana", WordCategory::Food, day(1), None).unwrap();
        vocab.add("cat", WordCategory::Animals, day(5), None).unwrap();

        vocab
            .update(&id, |w| {
                w.date_first_said = day(9);
                w.notes = Some("says 'nana'".to_string());
            })
            .unwrap();

        let last = vocab.words().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.notes.as_deref(), Some("says 'nana'"));
    }

    #[test]
    fn update_rejecting_collision_leaves_word_intact() {
        let mut vocab = Vocabulary::new();
        vocab.add("cat", WordCategory::Animals, day(1), None).unwrap();
        let id = vocab.add("dog", WordCategory::Animals, day(2), None).unwrap();

        let err = vocab.update(&id, |w| w.word = "CAT".to_string()).unwrap_err();
        assert_eq!(err, VocabularyError::Duplicate("CAT".to_string()));
        assert_eq!(vocab.get(&id).unwrap().word, "dog");
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn update_unknown_errors() {
        let mut vocab = Vocabulary::new();
        let id = WordId::new("missing").unwrap();
        assert_eq!(
            vocab.update(&id, |_| {}),
            Err(VocabularyError::Unknown(id))
        );
    }

    #[test]
    fn remove_and_counts() {
        let mut vocab = Vocabulary::new();
        let mama = vocab.add("mama", WordCategory::People, day(1), None).unwrap();
        vocab.add("dada", WordCategory::People, day(2), None).unwrap();
        vocab.add("milk", WordCategory::Food, day(3), None).unwrap();

        let counts = vocab.counts_by_category();
        assert_eq!(counts.get(&WordCategory::People), Some(&2));
        assert_eq!(counts.get(&WordCategory::Food), Some(&1));
        assert!(!counts.contains_key(&WordCategory::Animals));

        assert!(vocab.remove(&mama).is_some());
        assert!(vocab.remove(&mama).is_none());
        assert!(vocab.find("MAMA").is_none());
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Food".parse::<WordCategory>(), Ok(WordCategory::Food));
        assert!("vehicles".parse::<WordCategory>().is_err());
    }
}
