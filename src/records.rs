use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// One interval as it appears in the downloaded artifact file.
#[derive(Debug, Deserialize)]
struct RawInterval {
    level: EventLevel,
    locator: String,
    message: String,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct IntervalList {
    items: Vec<RawInterval>,
}

/// An interval ready for indexing, with the source file, job id and a
/// duration label injected. The duration drives the store's gantt view.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedEvent {
    pub level: EventLevel,
    pub locator: String,
    pub message: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: String,
}

/// Parse an artifact file and normalize every record in it. One malformed
/// record fails the whole file; the batcher never sees a partial record set.
pub fn parse_and_normalize(path: &Path, job_id: &str) -> Result<Vec<NormalizedEvent>, IngestError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parse_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
        IngestError::ArtifactParseFailed {
            file: file_name.clone(),
            source,
        }
    };

    let raw = std::fs::read_to_string(path).map_err(|e| parse_failed(Box::new(e)))?;
    let list: IntervalList = serde_json::from_str(&raw).map_err(|e| parse_failed(Box::new(e)))?;
    info!(file = %file_name, intervals = list.items.len(), "parsed event intervals");

    Ok(list
        .items
        .into_iter()
        .map(|raw| normalize(raw, &file_name, job_id))
        .collect())
}

fn normalize(raw: RawInterval, source_file: &str, job_id: &str) -> NormalizedEvent {
    NormalizedEvent {
        duration_seconds: duration_label(raw.from, raw.to),
        level: raw.level,
        locator: raw.locator,
        message: raw.message,
        from: raw.from,
        to: raw.to,
        source_file: source_file.to_string(),
        job_id: job_id.to_string(),
    }
}

/// Whole seconds between the timestamps, ties rounded away from zero,
/// rendered as `"<n>s"`.
fn duration_label(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let secs = (to - from).num_milliseconds() as f64 / 1000.0;
    format!("{}s", secs.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, millis * 1_000_000).unwrap()
    }

    #[test]
    fn duration_rounds_down_below_half() {
        assert_eq!(duration_label(at(0, 0), at(90, 400)), "90s");
    }

    #[test]
    fn duration_half_rounds_away_from_zero() {
        assert_eq!(duration_label(at(0, 0), at(90, 500)), "91s");
    }

    #[test]
    fn zero_duration() {
        assert_eq!(duration_label(at(5, 0), at(5, 0)), "0s");
    }

    #[test]
    fn parse_injects_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e-events_20240101-000000.json");
        std::fs::write(
            &path,
            r#"{"items":[{"level":"Warning","locator":"ns/openshift-etcd","message":"degraded",
                "from":"2024-01-01T00:00:00Z","to":"2024-01-01T00:01:00Z"}]}"#,
        )
        .unwrap();

        let events = parse_and_normalize(&path, "job-123").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_file, "e2e-events_20240101-000000.json");
        assert_eq!(events[0].job_id, "job-123");
        assert_eq!(events[0].duration_seconds, "60s");
        assert_eq!(events[0].level, EventLevel::Warning);
    }

    #[test]
    fn serialized_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e-events_x.json");
        std::fs::write(
            &path,
            r#"{"items":[{"level":"Info","locator":"l","message":"m",
                "from":"2024-01-01T00:00:00Z","to":"2024-01-01T00:00:01Z"}]}"#,
        )
        .unwrap();

        let events = parse_and_normalize(&path, "j").unwrap();
        let value = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(value["sourceFile"], "e2e-events_x.json");
        assert_eq!(value["jobID"], "j");
        assert_eq!(value["durationSeconds"], "1s");
        assert_eq!(value["level"], "Info");
    }

    #[test]
    fn bad_timestamp_fails_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e-events_bad.json");
        std::fs::write(
            &path,
            r#"{"items":[
                {"level":"Info","locator":"a","message":"ok",
                 "from":"2024-01-01T00:00:00Z","to":"2024-01-01T00:00:01Z"},
                {"level":"Info","locator":"b","message":"broken",
                 "from":"not-a-timestamp","to":"2024-01-01T00:00:01Z"}]}"#,
        )
        .unwrap();

        let err = parse_and_normalize(&path, "j").unwrap_err();
        assert!(matches!(err, IngestError::ArtifactParseFailed { .. }));
    }

    #[test]
    fn unknown_level_fails_the_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e-events_lvl.json");
        std::fs::write(
            &path,
            r#"{"items":[{"level":"Fatal","locator":"l","message":"m",
                "from":"2024-01-01T00:00:00Z","to":"2024-01-01T00:00:01Z"}]}"#,
        )
        .unwrap();

        let err = parse_and_normalize(&path, "j").unwrap_err();
        assert!(matches!(err, IngestError::ArtifactParseFailed { .. }));
    }
}
