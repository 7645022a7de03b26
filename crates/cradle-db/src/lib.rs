//! SQLite storage for cradle snapshots.
//!
//! The tracker hands over a complete [`Snapshot`] after every change and
//! gets one back on startup. Saving replaces the stored contents inside a
//! single transaction.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Move it between threads freely, but wrap it in a `Mutex` to
//! share it.
//!
//! # Schema
//!
//! Instants are stored as RFC 3339 TEXT in UTC with as many fractional
//! digits as needed, so they round-trip exactly. Calendar dates are stored
//! as `YYYY-MM-DD`. Event measurements and the profile are JSON columns.
//!
//! Rows are written in snapshot order and read back by `rowid`, so the
//! loaded snapshot has the same order as the saved one.
//!
//! Loading is lenient: a row that cannot be decoded is dropped with a
//! warning and the rest of the snapshot still loads.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use cradle_core::{
    CareEvent, Category, EntryId, EventId, GrowthEntry, Measurements, Milestone,
    MilestoneCategory, MilestoneId, Mood, Snapshot, SubjectProfile, Word, WordCategory, WordId,
};
use cradle_core::snapshot::{SNAPSHOT_VERSION, decode_record};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A JSON column could not be encoded.
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {id}: {timestamp}")]
    TimestampParse {
        id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row does not describe a valid record.
    #[error("invalid {table} row {id}: {message}")]
    InvalidRecord {
        table: &'static str,
        id: String,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

struct EventRow {
    id: String,
    timestamp: String,
    category: String,
    label: String,
    mood: String,
    duration: Option<i64>,
    note: Option<String>,
    measurements: Option<String>,
}

struct GrowthRow {
    id: String,
    source_event: Option<String>,
    date: String,
    weight: f64,
    height: f64,
    head_circumference: f64,
}

struct MilestoneRow {
    id: String,
    title: String,
    min_age_weeks: i64,
    max_age_weeks: i64,
    category: String,
    description: String,
    is_predefined: bool,
    is_completed: bool,
    completed_date: Option<String>,
}

struct WordRow {
    id: String,
    word: String,
    category: String,
    date_first_said: String,
    notes: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Care events
            -- timestamp: RFC 3339 UTC (e.g., '2025-03-01T09:30:00Z')
            -- measurements: JSON object or NULL
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                category TEXT NOT NULL,
                label TEXT NOT NULL,
                mood TEXT NOT NULL DEFAULT 'neutral',
                duration INTEGER,
                note TEXT,
                measurements TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_category ON events(category);

            CREATE TABLE IF NOT EXISTS growth_entries (
                id TEXT PRIMARY KEY,
                source_event TEXT,
                date TEXT NOT NULL,
                weight REAL NOT NULL DEFAULT 0,
                height REAL NOT NULL DEFAULT 0,
                head_circumference REAL NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_growth_date ON growth_entries(date);

            -- Only completed catalog milestones and user milestones are stored
            CREATE TABLE IF NOT EXISTS milestones (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                min_age_weeks INTEGER NOT NULL,
                max_age_weeks INTEGER NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_predefined INTEGER NOT NULL DEFAULT 0,
                is_completed INTEGER NOT NULL DEFAULT 0,
                completed_date TEXT
            );

            CREATE TABLE IF NOT EXISTS words (
                id TEXT PRIMARY KEY,
                word TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'other',
                date_first_said TEXT NOT NULL,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_words_date ON words(date_first_said);

            -- Single-row table holding the subject profile as JSON
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Replaces everything stored with `snapshot`.
    pub fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "
            DELETE FROM events;
            DELETE FROM growth_entries;
            DELETE FROM milestones;
            DELETE FROM words;
            DELETE FROM profile;
            ",
        )?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO events
                (id, timestamp, category, label, mood, duration, note, measurements)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for event in &snapshot.events {
                let measurements = event
                    .measurements
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|source| DbError::Encode {
                        what: "measurements",
                        source,
                    })?;
                stmt.execute(params![
                    event.id.as_str(),
                    format_timestamp(event.timestamp),
                    event.category.as_str(),
                    event.label,
                    event.mood.as_str(),
                    event.duration,
                    event.note,
                    measurements,
                ])?;
            }

            let mut stmt = tx.prepare(
                "
                INSERT INTO growth_entries
                (id, source_event, date, weight, height, head_circumference)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for entry in &snapshot.growth {
                stmt.execute(params![
                    entry.id.as_str(),
                    entry.source_event.as_ref().map(EventId::as_str),
                    format_timestamp(entry.date),
                    entry.weight,
                    entry.height,
                    entry.head_circumference,
                ])?;
            }

            let mut stmt = tx.prepare(
                "
                INSERT INTO milestones
                (id, title, min_age_weeks, max_age_weeks, category, description,
                 is_predefined, is_completed, completed_date)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for milestone in &snapshot.milestones {
                stmt.execute(params![
                    milestone.id.as_str(),
                    milestone.title,
                    milestone.min_age_weeks,
                    milestone.max_age_weeks,
                    milestone.category.as_str(),
                    milestone.description,
                    milestone.is_predefined,
                    milestone.is_completed,
                    milestone.completed_date.map(|d| d.to_string()),
                ])?;
            }

            let mut stmt = tx.prepare(
                "
                INSERT INTO words (id, word, category, date_first_said, notes)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for word in &snapshot.words {
                stmt.execute(params![
                    word.id.as_str(),
                    word.word,
                    word.category.as_str(),
                    word.date_first_said.to_string(),
                    word.notes,
                ])?;
            }

            if let Some(profile) = &snapshot.profile {
                let data = serde_json::to_string(profile).map_err(|source| DbError::Encode {
                    what: "profile",
                    source,
                })?;
                tx.execute("INSERT INTO profile (id, data) VALUES (1, ?)", [data])?;
            }
        }
        tx.commit()?;
        tracing::debug!(
            events = snapshot.events.len(),
            growth = snapshot.growth.len(),
            milestones = snapshot.milestones.len(),
            words = snapshot.words.len(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Loads the stored snapshot, dropping rows that fail to decode.
    pub fn load_snapshot(&self) -> Result<Snapshot, DbError> {
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            events: keep_valid("events", self.event_rows()?, decode_event),
            growth: keep_valid("growth_entries", self.growth_rows()?, decode_growth),
            milestones: keep_valid("milestones", self.milestone_rows()?, decode_milestone),
            words: keep_valid("words", self.word_rows()?, decode_word),
            profile: self.profile()?,
        })
    }

    fn event_rows(&self) -> Result<Vec<EventRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, timestamp, category, label, mood, duration, note, measurements
            FROM events
            ORDER BY rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EventRow {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                category: row.get(2)?,
                label: row.get(3)?,
                mood: row.get(4)?,
                duration: row.get(5)?,
                note: row.get(6)?,
                measurements: row.get(7)?,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    fn growth_rows(&self) -> Result<Vec<GrowthRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, source_event, date, weight, height, head_circumference
            FROM growth_entries
            ORDER BY rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(GrowthRow {
                id: row.get(0)?,
                source_event: row.get(1)?,
                date: row.get(2)?,
                weight: row.get(3)?,
                height: row.get(4)?,
                head_circumference: row.get(5)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn milestone_rows(&self) -> Result<Vec<MilestoneRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, title, min_age_weeks, max_age_weeks, category, description,
                   is_predefined, is_completed, completed_date
            FROM milestones
            ORDER BY rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MilestoneRow {
                id: row.get(0)?,
                title: row.get(1)?,
                min_age_weeks: row.get(2)?,
                max_age_weeks: row.get(3)?,
                category: row.get(4)?,
                description: row.get(5)?,
                is_predefined: row.get(6)?,
                is_completed: row.get(7)?,
                completed_date: row.get(8)?,
            })
        })?;
        let mut milestones = Vec::new();
        for row in rows {
            milestones.push(row?);
        }
        Ok(milestones)
    }

    fn word_rows(&self) -> Result<Vec<WordRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, word, category, date_first_said, notes
            FROM words
            ORDER BY rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WordRow {
                id: row.get(0)?,
                word: row.get(1)?,
                category: row.get(2)?,
                date_first_said: row.get(3)?,
                notes: row.get(4)?,
            })
        })?;
        let mut words = Vec::new();
        for row in rows {
            words.push(row?);
        }
        Ok(words)
    }

    fn profile(&self) -> Result<Option<SubjectProfile>, DbError> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM profile WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        Ok(data.and_then(|json| decode_record("profile", &json)))
    }
}

/// Decodes each row, logging and dropping the ones that fail.
fn keep_valid<R, T>(
    table: &'static str,
    rows: Vec<R>,
    decode: impl Fn(R) -> Result<T, DbError>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match decode(row) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(table, %err, "dropping corrupt row");
                None
            }
        })
        .collect()
}

fn invalid(table: &'static str, id: &str, message: impl ToString) -> DbError {
    DbError::InvalidRecord {
        table,
        id: id.to_string(),
        message: message.to_string(),
    }
}

fn decode_event(row: EventRow) -> Result<CareEvent, DbError> {
    const TABLE: &str = "events";
    let id = EventId::new(row.id.as_str()).map_err(|e| invalid(TABLE, &row.id, e))?;
    let category: Category = row
        .category
        .parse()
        .map_err(|e| invalid(TABLE, &row.id, e))?;
    let mood: Mood = row.mood.parse().map_err(|e: String| invalid(TABLE, &row.id, e))?;
    let duration = row
        .duration
        .map(u32::try_from)
        .transpose()
        .map_err(|e| invalid(TABLE, &row.id, e))?;
    let measurements = row
        .measurements
        .as_deref()
        .map(serde_json::from_str::<Measurements>)
        .transpose()
        .map_err(|e| invalid(TABLE, &row.id, e))?;
    Ok(CareEvent {
        timestamp: parse_timestamp(&row.timestamp, &row.id)?,
        id,
        category,
        label: row.label,
        mood,
        duration,
        note: row.note,
        measurements,
    })
}

fn decode_growth(row: GrowthRow) -> Result<GrowthEntry, DbError> {
    const TABLE: &str = "growth_entries";
    let source_event = row
        .source_event
        .map(EventId::new)
        .transpose()
        .map_err(|e| invalid(TABLE, &row.id, e))?;
    Ok(GrowthEntry {
        date: parse_timestamp(&row.date, &row.id)?,
        id: EntryId::new(row.id.as_str()).map_err(|e| invalid(TABLE, &row.id, e))?,
        source_event,
        weight: row.weight,
        height: row.height,
        head_circumference: row.head_circumference,
    })
}

fn decode_milestone(row: MilestoneRow) -> Result<Milestone, DbError> {
    const TABLE: &str = "milestones";
    let weeks = |value: i64| u32::try_from(value).map_err(|e| invalid(TABLE, &row.id, e));
    let category: MilestoneCategory = row
        .category
        .parse()
        .map_err(|e: String| invalid(TABLE, &row.id, e))?;
    let completed_date = row
        .completed_date
        .as_deref()
        .map(|d| parse_date(d, TABLE, &row.id))
        .transpose()?;
    Ok(Milestone {
        id: MilestoneId::new(row.id.as_str()).map_err(|e| invalid(TABLE, &row.id, e))?,
        min_age_weeks: weeks(row.min_age_weeks)?,
        max_age_weeks: weeks(row.max_age_weeks)?,
        title: row.title,
        category,
        description: row.description,
        is_predefined: row.is_predefined,
        is_completed: row.is_completed,
        completed_date,
    })
}

fn decode_word(row: WordRow) -> Result<Word, DbError> {
    const TABLE: &str = "words";
    let category: WordCategory = row
        .category
        .parse()
        .map_err(|e: String| invalid(TABLE, &row.id, e))?;
    Ok(Word {
        date_first_said: parse_date(&row.date_first_said, TABLE, &row.id)?,
        id: WordId::new(row.id.as_str()).map_err(|e| invalid(TABLE, &row.id, e))?,
        word: row.word,
        category,
        notes: row.notes,
    })
}

fn parse_timestamp(timestamp: &str, id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn parse_date(date: &str, table: &'static str, id: &str) -> Result<NaiveDate, DbError> {
    date.parse::<NaiveDate>().map_err(|e| invalid(table, id, e))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use cradle_core::{MilestoneBook, Sex, UnitSystem, Vocabulary};

    fn sample() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap()
            + chrono::Duration::microseconds(250);
        let growth_event = CareEvent::new(Category::Growth, at, "Checkup")
            .with_id(EventId::new("e-growth").unwrap())
            .with_measurements(Measurements::new(Some(5.6), None, Some(39.1)).unwrap());
        let nap = CareEvent::new(Category::Sleep, at + chrono::Duration::hours(2), "Nap")
            .with_id(EventId::new("e-nap").unwrap())
            .with_mood(Mood::Sleepy)
            .with_duration(45)
            .with_note("in the stroller");
        let entry = GrowthEntry {
            id: EntryId::new("g-1").unwrap(),
            source_event: Some(growth_event.id.clone()),
            date: at,
            weight: 5.6,
            height: 0.0,
            head_circumference: 39.1,
        };

        let mut book = MilestoneBook::new();
        book.complete(
            &MilestoneId::new("pre-coos").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 27).unwrap(),
        )
        .unwrap();
        book.add_custom("Finds thumb", 4, 12, MilestoneCategory::Motor, "")
            .unwrap();

        let mut vocab = Vocabulary::new();
        vocab
            .add("uh-oh", WordCategory::Social, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(), None)
            .unwrap();

        let mut profile =
            SubjectProfile::new("Ada", NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        profile.sex = Some(Sex::Female);
        profile.units = UnitSystem::Imperial;

        Snapshot {
            version: SNAPSHOT_VERSION,
            events: vec![growth_event, nap],
            growth: vec![entry],
            milestones: book.records().to_vec(),
            words: vocab.words().to_vec(),
            profile: Some(profile),
        }
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_has_every_table() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let mut stmt = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare sqlite_master");
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("query sqlite_master")
            .map(|row| row.expect("table row"))
            .collect();
        assert_eq!(
            tables,
            vec!["events", "growth_entries", "milestones", "profile", "words"]
        );
    }

    #[test]
    fn empty_database_loads_empty_snapshot() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let snapshot = db.load_snapshot().unwrap();
        assert_eq!(snapshot, Snapshot {
            version: SNAPSHOT_VERSION,
            ..Snapshot::default()
        });
    }

    #[test]
    fn snapshot_round_trip_is_lossless() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let snapshot = sample();
        db.save_snapshot(&snapshot).unwrap();
        assert_eq!(db.load_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn converted_measurements_round_trip_bit_for_bit() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut snapshot = sample();
        let units = UnitSystem::Imperial;
        let (weight, head) = (units.weight_to_kg(1.005), units.length_to_cm(15.37));
        snapshot.events[0].measurements =
            Some(Measurements::new(Some(weight), None, Some(head)).unwrap());
        snapshot.growth[0].weight = weight;
        snapshot.growth[0].head_circumference = head;

        db.save_snapshot(&snapshot).unwrap();
        let loaded = db.load_snapshot().unwrap();
        assert_eq!(loaded, snapshot);
        let measurements = loaded.events[0].measurements.unwrap();
        assert_eq!(measurements.weight.unwrap().to_bits(), weight.to_bits());
        assert_eq!(loaded.growth[0].head_circumference.to_bits(), head.to_bits());
    }

    #[test]
    fn save_replaces_previous_contents() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.save_snapshot(&sample()).unwrap();

        let mut smaller = sample();
        smaller.events.truncate(1);
        smaller.words.clear();
        smaller.profile = None;
        db.save_snapshot(&smaller).unwrap();

        assert_eq!(db.load_snapshot().unwrap(), smaller);
    }

    #[test]
    fn corrupt_rows_are_dropped() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.save_snapshot(&sample()).unwrap();
        db.conn
            .execute_batch(
                "
                INSERT INTO events (id, timestamp, category, label)
                VALUES ('bad-time', 'yesterday', 'feeding', 'Bottle');
                INSERT INTO events (id, timestamp, category, label)
                VALUES ('bad-cat', '2025-03-01T10:00:00Z', 'juggling', 'x');
                INSERT INTO events (id, timestamp, category, label, duration)
                VALUES ('bad-duration', '2025-03-01T10:00:00Z', 'sleep', 'Nap', -5);
                INSERT INTO events (id, timestamp, category, label, measurements)
                VALUES ('bad-weight', '2025-03-01T10:00:00Z', 'growth', 'Scale', '{\"weight\": -1.5}');
                INSERT INTO words (id, word, date_first_said)
                VALUES ('w-bad', 'ball', 'last spring');
                UPDATE profile SET data = '{\"name\": 7}';
                ",
            )
            .unwrap();

        let snapshot = db.load_snapshot().unwrap();
        let ids: Vec<_> = snapshot.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e-growth", "e-nap"]);
        assert_eq!(snapshot.words.len(), 1);
        assert!(snapshot.profile.is_none());
    }

    #[test]
    fn data_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cradle.db");
        let snapshot = sample();
        {
            let mut db = Database::open(&path).unwrap();
            db.save_snapshot(&snapshot).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_snapshot().unwrap(), snapshot);
    }
}
