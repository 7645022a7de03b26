//! Words command for the first-words vocabulary.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use cradle_core::{Vocabulary, WordCategory, WordId};
use cradle_db::Database;

use super::util::{load_tracker, parse_date, save_tracker};
use crate::{Config, WordsAction};

#[derive(Debug, Args)]
pub struct WordAddArgs {
    /// The word as said.
    pub word: String,

    /// Category: people, food, animals, objects, actions, social or other.
    #[arg(long, default_value = "other")]
    pub category: WordCategory,

    /// Date first said: YYYY-MM-DD, "today" or "yesterday".
    #[arg(long, default_value = "today")]
    pub on: String,

    /// Free-form notes.
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct WordEditArgs {
    /// The word ID.
    pub id: String,

    /// New spelling.
    #[arg(long)]
    pub word: Option<String>,

    /// New category.
    #[arg(long)]
    pub category: Option<WordCategory>,

    /// New date first said.
    #[arg(long)]
    pub on: Option<String>,

    /// New notes. An empty string clears them.
    #[arg(long)]
    pub notes: Option<String>,
}

fn non_empty(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, action: &WordsAction) -> Result<()> {
    let mut tracker = load_tracker(db, config)?;

    match action {
        WordsAction::List { json } => {
            if *json {
                writeln!(
                    writer,
                    "{}",
                    serde_json::to_string_pretty(tracker.vocabulary().words())?
                )?;
            } else {
                write!(writer, "{}", format_words(tracker.vocabulary()))?;
            }
        }
        WordsAction::Add(args) => {
            let date = parse_date(&args.on, tracker.today())?;
            let id = tracker
                .add_word(&args.word, args.category, date, non_empty(args.notes.as_deref()))
                .with_context(|| format!("failed to add {:?}", args.word))?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Added word {id}")?;
        }
        WordsAction::Edit(args) => {
            let id = WordId::new(args.id.as_str())?;
            let date = args
                .on
                .as_deref()
                .map(|on| parse_date(on, tracker.today()))
                .transpose()?;
            tracker
                .update_word(&id, |word| {
                    if let Some(spelling) = &args.word {
                        word.word.clone_from(spelling);
                    }
                    if let Some(category) = args.category {
                        word.category = category;
                    }
                    if let Some(date) = date {
                        word.date_first_said = date;
                    }
                    if let Some(notes) = args.notes.as_deref() {
                        word.notes = non_empty(Some(notes));
                    }
                })
                .with_context(|| format!("failed to edit {id}"))?;
            save_tracker(db, &tracker)?;
            writeln!(writer, "Updated word {id}")?;
        }
        WordsAction::Remove { id } => {
            let id = WordId::new(id.as_str())?;
            if tracker.remove_word(&id).is_some() {
                save_tracker(db, &tracker)?;
                writeln!(writer, "Removed word {id}")?;
            } else {
                writeln!(writer, "No word with id {id}")?;
            }
        }
    }
    Ok(())
}

pub fn format_words(vocabulary: &Vocabulary) -> String {
    let mut output = String::new();
    if vocabulary.is_empty() {
        writeln!(output, "No words yet.").unwrap();
        return output;
    }
    for word in vocabulary.words() {
        write!(
            output,
            "{}  {} ({})",
            word.date_first_said, word.word, word.category
        )
        .unwrap();
        if let Some(notes) = &word.notes {
            write!(output, " - {notes}").unwrap();
        }
        writeln!(output, "  {}", word.id).unwrap();
    }

    let counts: Vec<String> = vocabulary
        .counts_by_category()
        .into_iter()
        .map(|(category, count)| format!("{category} {count}"))
        .collect();
    writeln!(output, "{} words: {}", vocabulary.len(), counts.join(", ")).unwrap();
    output
}
