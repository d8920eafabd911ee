//! Fixed-interval polling loop
//!
//! Each cycle searches for recent error entries, matches them against the
//! keyword rules, remediates matches one at a time and then sleeps for the
//! poll interval. Nothing inside a cycle is fatal.

use crate::clock::Clock;
use crate::commands::CommandRunner;
use crate::config::Config;
use crate::remediation::{RemediationEngine, RemediationOutcome};
use crate::search::{QueryBuilder, SearchClient};
use crate::triggers::KeywordMatcher;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Summary of one monitor cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries returned by the error search
    pub entries_seen: usize,
    /// Remediation outcome per matched entry, in processing order
    pub remediations: Vec<(String, RemediationOutcome)>,
}

/// Drives the poll-match-remediate cycle
pub struct MonitorLoop {
    query_builder: QueryBuilder,
    search: SearchClient,
    matcher: KeywordMatcher,
    engine: RemediationEngine,
    clock: Arc<dyn Clock>,
    index_pattern: String,
    lookback: Duration,
    poll_interval: Duration,
}

impl MonitorLoop {
    /// Wire up a monitor from configuration and injected collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Validated application configuration
    /// * `search` - Client for the search backend, shared with remediation
    /// * `runner` - Executes health checks and remediation actions
    /// * `clock` - Time source for queries and delays
    pub fn new(
        config: &Config,
        search: SearchClient,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut engine = RemediationEngine::new(
            search.clone(),
            runner,
            Arc::clone(&clock),
            config.search.index_pattern.clone(),
        )
        .with_action_delay(config.monitor.action_delay());

        if let Some(window) = config.monitor.remediation_cooldown() {
            engine = engine.with_cooldown(window);
        }

        Self {
            query_builder: QueryBuilder::new(&config.monitor.self_log_path),
            search,
            matcher: KeywordMatcher::new(config.keywords.clone()),
            engine,
            clock,
            index_pattern: config.search.index_pattern.clone(),
            lookback: config.monitor.lookback(),
            poll_interval: config.monitor.poll_interval(),
        }
    }

    /// Run a single cycle without the trailing sleep
    pub async fn run_cycle(&mut self) -> CycleReport {
        info!("Starting new iteration to query logs.");

        let query = self.query_builder.build(self.clock.now(), self.lookback);
        let entries = self.search.search(&self.index_pattern, &query).await;

        let mut report = CycleReport {
            entries_seen: entries.len(),
            remediations: Vec::new(),
        };

        for entry in &entries {
            info!(
                "Log entry: Timestamp: {}, Message: {}, Log File: {}",
                entry.timestamp, entry.message, entry.source_path
            );

            let Some((keyword, rule)) = self.matcher.find_match(&entry.message) else {
                continue;
            };

            info!(
                "Keyword '{}' found in log. Performing additional search.",
                keyword
            );
            let outcome = self.engine.handle(keyword, rule).await;
            debug!("Remediation of '{}' finished: {:?}", keyword, outcome);
            report.remediations.push((keyword.to_string(), outcome));
        }

        report
    }

    /// Run cycles until `running` is cleared
    ///
    /// The flag is checked before each cycle and after each sleep, so a stop
    /// request takes effect once the current cycle and its sleep complete.
    pub async fn run(&mut self, running: Arc<AtomicBool>) {
        info!(
            "Monitoring index pattern {} every {:?} with {} keyword rule(s)",
            self.index_pattern,
            self.poll_interval,
            self.matcher.rule_count()
        );

        while running.load(Ordering::SeqCst) {
            self.run_cycle().await;

            if !running.load(Ordering::SeqCst) {
                break;
            }

            info!(
                "Waiting for {} secs before the next iteration.",
                self.poll_interval.as_secs()
            );
            self.clock.sleep(self.poll_interval).await;
        }

        info!("Monitor loop stopped");
    }
}
