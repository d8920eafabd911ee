//! Core data types shared across the monitor
//!
//! This module defines the log entries returned by the search backend and the
//! results produced by command invocations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Source path reported for entries that carry no `log.file.path` field
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A single log entry returned by the search backend
///
/// Entries are read-only snapshots of the `_source` document of a search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// ISO-8601 timestamp as stored in the index
    pub timestamp: String,
    /// The log message content
    pub message: String,
    /// Path of the file the entry was shipped from
    pub source_path: String,
}

/// Raw `_source` document layout as indexed by Filebeat-style shippers
#[derive(Debug, Deserialize)]
struct SourceDocument {
    #[serde(rename = "@timestamp", default)]
    timestamp: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    log: Option<LogField>,
}

#[derive(Debug, Deserialize)]
struct LogField {
    #[serde(default)]
    file: Option<FileField>,
}

#[derive(Debug, Deserialize)]
struct FileField {
    #[serde(default)]
    path: Option<String>,
}

impl LogEntry {
    /// Create a log entry from its parts
    pub fn new(
        timestamp: impl Into<String>,
        message: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
            source_path: source_path.into(),
        }
    }

    /// Decode a log entry from a hit's `_source` document
    ///
    /// Missing fields are tolerated: the message defaults to an empty string
    /// and the source path to [`UNKNOWN_SOURCE`]. Epoch-millisecond
    /// timestamps are rendered as RFC 3339; other non-string values are kept
    /// in their JSON form.
    pub fn from_source(source: Value) -> Result<Self, serde_json::Error> {
        let doc: SourceDocument = serde_json::from_value(source)?;

        let source_path = doc
            .log
            .and_then(|log| log.file)
            .and_then(|file| file.path)
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        Ok(Self {
            timestamp: doc.timestamp.map(render_timestamp).unwrap_or_default(),
            message: doc.message.map(render_text).unwrap_or_default(),
            source_path,
        })
    }
}

fn render_timestamp(value: Value) -> String {
    let millis = value
        .as_i64()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));

    millis.unwrap_or_else(|| render_text(value))
}

fn render_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Outcome of a single command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command exited with status zero
    pub succeeded: bool,
    /// Captured standard output, present only on success
    pub output: Option<String>,
    /// Captured standard error or launch failure text
    pub error_text: Option<String>,
}

impl CommandResult {
    /// A successful run with the captured standard output
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: Some(output.into()),
            error_text: None,
        }
    }

    /// A failed run; output is always absent
    pub fn failure(error_text: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: None,
            error_text: Some(error_text.into()),
        }
    }

    /// Whether this result counts as a healthy health check
    ///
    /// A health check is healthy when it succeeded and printed something.
    pub fn is_healthy(&self) -> bool {
        self.succeeded && self.output.as_deref().is_some_and(|out| !out.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_source_full_document() {
        let source = json!({
            "@timestamp": "2024-05-01T10:00:00.000Z",
            "message": "disk-full error on /var",
            "log": { "file": { "path": "/var/log/app.log" } }
        });

        let entry = LogEntry::from_source(source).unwrap();
        assert_eq!(entry.timestamp, "2024-05-01T10:00:00.000Z");
        assert_eq!(entry.message, "disk-full error on /var");
        assert_eq!(entry.source_path, "/var/log/app.log");
    }

    #[test]
    fn test_from_source_missing_fields() {
        let entry = LogEntry::from_source(json!({ "message": "error" })).unwrap();
        assert_eq!(entry.timestamp, "");
        assert_eq!(entry.source_path, UNKNOWN_SOURCE);

        let entry = LogEntry::from_source(json!({ "log": {} })).unwrap();
        assert_eq!(entry.message, "");
        assert_eq!(entry.source_path, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_from_source_numeric_fields() {
        let entry = LogEntry::from_source(json!({
            "@timestamp": 1714557600000i64,
            "message": 503,
        }))
        .unwrap();

        assert_eq!(entry.timestamp, "2024-05-01T10:00:00.000Z");
        assert_eq!(entry.message, "503");
    }

    #[test]
    fn test_from_source_rejects_non_object() {
        assert!(LogEntry::from_source(json!("not a document")).is_err());
    }

    #[test]
    fn test_command_result_health() {
        assert!(CommandResult::success("ok\n").is_healthy());
        assert!(!CommandResult::success("").is_healthy());
        assert!(!CommandResult::failure("boom").is_healthy());
        assert_eq!(CommandResult::failure("boom").output, None);
    }
}
