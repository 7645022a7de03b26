//! Merge command for combining events from another device.
//!
//! The remote batch is read and decoded on a background task. If that task
//! fails for any reason the failure is logged and local data is left alone.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cradle_core::snapshot::decode_record;
use cradle_core::{CareEvent, Snapshot};
use cradle_db::Database;
use serde_json::value::RawValue;

use super::util::{load_tracker, save_tracker};
use crate::Config;

/// Decodes a remote batch: a JSON array of events or a full snapshot.
///
/// Events that fail to decode are dropped.
pub fn parse_remote(json: &str) -> Result<Vec<CareEvent>> {
    if json.trim_start().starts_with('[') {
        let raw: Vec<Box<RawValue>> =
            serde_json::from_str(json).context("remote batch is not a JSON array")?;
        return Ok(raw
            .iter()
            .filter_map(|value| decode_record("event", value.get()))
            .collect());
    }
    let snapshot = Snapshot::from_json(json).context("remote batch is not a snapshot")?;
    Ok(snapshot.events)
}

/// Reads and decodes the remote batch at `path`.
pub async fn fetch_remote(path: PathBuf) -> Result<Vec<CareEvent>> {
    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_remote(&json)
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, file: &Path) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let task = runtime.spawn(fetch_remote(file.to_path_buf()));
    let remote = match runtime.block_on(task) {
        Ok(Ok(events)) => events,
        Ok(Err(err)) => {
            tracing::warn!(error = %format!("{err:#}"), "remote merge failed; local data unchanged");
            writeln!(writer, "Nothing merged.")?;
            return Ok(());
        }
        Err(err) => {
            tracing::warn!(error = %err, "remote merge task aborted; local data unchanged");
            writeln!(writer, "Nothing merged.")?;
            return Ok(());
        }
    };

    let mut tracker = load_tracker(db, config)?;
    let report = tracker.merge_remote(&remote);
    if report.added > 0 {
        save_tracker(db, &tracker)?;
    }
    writeln!(
        writer,
        "Merged {} new events, skipped {} duplicates",
        report.added, report.duplicates
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_array_dropping_bad_elements() {
        let json = r#"[
            {"id": "r-1", "category": "feeding", "timestamp": "2025-03-10T10:00:00Z", "label": "Bottle"},
            {"id": "", "category": "feeding", "timestamp": "2025-03-10T11:00:00Z", "label": "Bottle"},
            {"id": "r-3", "category": "teleport", "timestamp": "2025-03-10T12:00:00Z", "label": "?"}
        ]"#;
        let events = parse_remote(json).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_str(), "r-1");
    }

    #[test]
    fn parses_snapshot_events() {
        let json = r#"{"version": 1, "events": [
            {"id": "r-1", "category": "diaper", "timestamp": "2025-03-10T10:00:00Z", "label": "Wet"}
        ]}"#;
        let events = parse_remote(json).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_remote("not json").is_err());
        assert!(parse_remote(r#"{"version": 99}"#).is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_without_panicking() {
        let temp = tempfile::tempdir().unwrap();
        let result = fetch_remote(temp.path().join("missing.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reads_remote_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("remote.json");
        tokio::fs::write(
            &path,
            r#"[{"id": "r-1", "category": "sleep", "timestamp": "2025-03-10T10:00:00Z", "label": "Nap", "duration": 45}]"#,
        )
        .await
        .unwrap();
        let events = fetch_remote(path).await.unwrap();
        assert_eq!(events[0].duration, Some(45));
    }
}
