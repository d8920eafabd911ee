//! Scripted test doubles shared by the remediation and monitor tests

use crate::clock::Clock;
use crate::commands::CommandRunner;
use crate::config::{KeywordRule, RemediationAction};
use crate::error::SearchError;
use crate::events::{CommandResult, LogEntry};
use crate::search::SearchBackend;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// The `disk-full` rule used throughout the scenarios
pub(crate) fn disk_full_rule() -> KeywordRule {
    rule_with_actions(&["cleanup.sh"])
}

pub(crate) fn rule_with_actions(actions: &[&str]) -> KeywordRule {
    KeywordRule {
        success_log: "cleanup triggered".to_string(),
        healthcheck: "check.sh".to_string(),
        actions: actions.iter().map(|a| RemediationAction::new(*a)).collect(),
    }
}

/// Clock that records requested sleeps and advances simulated time instead
pub(crate) struct RecordingClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub(crate) fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += chrono::Duration::from_std(duration).unwrap();
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
        Box::pin(async {})
    }
}

/// Command runner with a scripted health check
///
/// The health check is unhealthy unless the runner was built healthy, or the
/// configured recovery action has already run. Every other command succeeds
/// unless listed as failing.
pub(crate) struct ScriptedRunner {
    healthcheck: String,
    healthy_initially: bool,
    healthy_after: Option<String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new(healthcheck: &str) -> Self {
        Self {
            healthcheck: healthcheck.to_string(),
            healthy_initially: false,
            healthy_after: None,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn healthy_initially(mut self) -> Self {
        self.healthy_initially = true;
        self
    }

    pub(crate) fn healthy_after(mut self, action: &str) -> Self {
        self.healthy_after = Some(action.to_string());
        self
    }

    pub(crate) fn failing(mut self, command: &str) -> Self {
        self.failing.insert(command.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands run other than the health check, in order
    pub(crate) fn actions_run(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| *c != self.healthcheck)
            .collect()
    }

    pub(crate) fn health_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == self.healthcheck)
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> Pin<Box<dyn Future<Output = CommandResult> + Send>> {
        let mut calls = self.calls.lock().unwrap();

        let result = if command == self.healthcheck {
            let recovered = self
                .healthy_after
                .as_ref()
                .is_some_and(|action| calls.contains(action));
            if self.healthy_initially || recovered {
                CommandResult::success("healthy\n")
            } else {
                CommandResult::failure("unhealthy")
            }
        } else if self.failing.contains(command) {
            CommandResult::failure(format!("{} failed", command))
        } else {
            CommandResult::success(format!("{} done\n", command))
        };

        calls.push(command.to_string());
        Box::pin(async move { result })
    }
}

/// Response of the scripted main error search
#[derive(Clone)]
pub(crate) enum MainResponse {
    Entries(Vec<LogEntry>),
    IndexNotFound,
    Failure,
}

/// Search backend answering the error search and follow-up searches
///
/// Requests with a bool query are treated as the error search; requests with
/// a `match` query return the confirmations registered for their pattern.
pub(crate) struct ScriptedSearchBackend {
    main: MainResponse,
    confirmations: HashMap<String, Vec<LogEntry>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedSearchBackend {
    pub(crate) fn new() -> Self {
        Self {
            main: MainResponse::Entries(Vec::new()),
            confirmations: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_main(mut self, main: MainResponse) -> Self {
        self.main = main;
        self
    }

    pub(crate) fn with_confirmations(self, pattern: &str, count: usize) -> Self {
        let entries = (0..count)
            .map(|i| {
                LogEntry::new(
                    "2024-05-01T11:59:00Z",
                    format!("{} #{}", pattern, i),
                    "/var/log/app.log",
                )
            })
            .collect();
        self.with_confirmation_entries(pattern, entries)
    }

    pub(crate) fn with_confirmation_entries(
        mut self,
        pattern: &str,
        entries: Vec<LogEntry>,
    ) -> Self {
        self.confirmations.insert(pattern.to_string(), entries);
        self
    }

    /// Follow-up search patterns requested so far
    pub(crate) fn pattern_requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, body)| body["query"]["match"]["message"].as_str())
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl SearchBackend for ScriptedSearchBackend {
    fn search(
        &self,
        index_pattern: &str,
        body: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogEntry>, SearchError>> + Send>> {
        let result = if body["query"]["bool"].is_object() {
            match &self.main {
                MainResponse::Entries(entries) => Ok(entries.clone()),
                MainResponse::IndexNotFound => {
                    Err(SearchError::IndexNotFound(index_pattern.to_string()))
                }
                MainResponse::Failure => Err(SearchError::BackendError {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
            }
        } else {
            let pattern = body["query"]["match"]["message"].as_str().unwrap_or_default();
            Ok(self.confirmations.get(pattern).cloned().unwrap_or_default())
        };

        self.requests
            .lock()
            .unwrap()
            .push((index_pattern.to_string(), body));
        Box::pin(async move { result })
    }
}
