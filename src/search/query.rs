use crate::events::LogEntry;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

/// Default lookback window of the error search
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(5 * 60);

/// Substring every searched message must contain (case-insensitively)
pub const ERROR_PATTERN: &str = "error";

/// Index field holding the path of the shipped log file
pub const SOURCE_PATH_FIELD: &str = "log.file.path";

/// A negative filter applied to the error search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Drop entries whose message contains the given text
    MessageContains(String),
    /// Drop entries shipped from exactly this file path
    SourcePathEquals(String),
}

impl Exclusion {
    fn excludes(&self, entry: &LogEntry) -> bool {
        match self {
            Exclusion::MessageContains(text) => entry.message.contains(text.as_str()),
            Exclusion::SourcePathEquals(path) => entry.source_path == *path,
        }
    }

    fn to_clause(&self) -> Value {
        match self {
            Exclusion::MessageContains(text) => {
                json!({ "wildcard": { "message": format!("*{}*", text) } })
            }
            Exclusion::SourcePathEquals(path) => {
                json!({ "match_phrase": { (SOURCE_PATH_FIELD): path } })
            }
        }
    }
}

/// Time-windowed error search
///
/// Immutable once built. Renders to an Elasticsearch bool query and can also
/// be evaluated locally against an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    must_contain: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    must_not: Vec<Exclusion>,
}

impl SearchQuery {
    pub fn must_contain(&self) -> &str {
        &self.must_contain
    }

    /// Inclusive `(start, end)` bounds of the time window
    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.must_not
    }

    /// Render the query as an Elasticsearch `_search` request body
    pub fn to_request_body(&self) -> Value {
        let must_not: Vec<Value> = self.must_not.iter().map(Exclusion::to_clause).collect();

        json!({
            "query": {
                "bool": {
                    "must": [
                        {
                            "wildcard": {
                                "message": {
                                    "value": format!("*{}*", self.must_contain),
                                    "case_insensitive": true
                                }
                            }
                        },
                        {
                            "range": {
                                "@timestamp": {
                                    "gte": format_timestamp(self.start),
                                    "lte": format_timestamp(self.end)
                                }
                            }
                        }
                    ],
                    "must_not": must_not
                }
            }
        })
    }

    /// Evaluate the query against a single entry
    ///
    /// Entries with an unparseable timestamp never match.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let Ok(timestamp) = DateTime::parse_from_rfc3339(&entry.timestamp) else {
            return false;
        };
        let timestamp = timestamp.with_timezone(&Utc);

        entry
            .message
            .to_lowercase()
            .contains(&self.must_contain.to_lowercase())
            && timestamp >= self.start
            && timestamp <= self.end
            && !self.must_not.iter().any(|exclusion| exclusion.excludes(entry))
    }
}

/// Builds the per-cycle error search
///
/// Every query excludes the monitor's own log output so the monitor never
/// reacts to lines it wrote itself.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    self_log_path: String,
    self_log_name: Option<String>,
}

impl QueryBuilder {
    /// Create a builder that excludes the given log file
    pub fn new(self_log_path: impl AsRef<Path>) -> Self {
        let path = self_log_path.as_ref();
        let self_log_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty());

        Self {
            self_log_path: path.to_string_lossy().into_owned(),
            self_log_name,
        }
    }

    /// Build a query covering `[now - lookback, now]`
    pub fn build(&self, now: DateTime<Utc>, lookback: Duration) -> SearchQuery {
        let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::MAX);
        let start = now
            .checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut must_not = Vec::with_capacity(2);
        if let Some(name) = &self.self_log_name {
            must_not.push(Exclusion::MessageContains(name.clone()));
        }
        must_not.push(Exclusion::SourcePathEquals(self.self_log_path.clone()));

        SearchQuery {
            must_contain: ERROR_PATTERN.to_string(),
            start,
            end: now,
            must_not,
        }
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
