use crate::clock::Clock;
use crate::commands::CommandRunner;
use crate::config::{KeywordRule, RemediationAction};
use crate::remediation::RemediationCooldown;
use crate::search::SearchClient;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default wait between a remediation action and its health re-check
pub const DEFAULT_ACTION_DELAY: Duration = Duration::from_secs(10);

/// Stage of a remediation run, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationPhase {
    Idle,
    Searching,
    CheckingHealth,
    RunningAction,
    Validating,
}

impl fmt::Display for RemediationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemediationPhase::Idle => "idle",
            RemediationPhase::Searching => "searching",
            RemediationPhase::CheckingHealth => "checking-health",
            RemediationPhase::RunningAction => "running-action",
            RemediationPhase::Validating => "validating",
        };
        f.write_str(name)
    }
}

/// What a remediation run did for a keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// The keyword was remediated recently and was skipped
    CoolingDown,
    /// The follow-up search found no confirming entries
    NotConfirmed,
    /// The health check passed before any action ran
    AlreadyHealthy,
    /// An action restored health; later actions were skipped
    Recovered { action: String, attempts: usize },
    /// Every action ran and none restored health
    Unresolved { attempts: usize },
}

impl RemediationOutcome {
    /// Whether any remediation action was executed
    pub fn actions_ran(&self) -> bool {
        match self {
            RemediationOutcome::Recovered { .. } => true,
            RemediationOutcome::Unresolved { attempts } => *attempts > 0,
            _ => false,
        }
    }
}

/// Confirms, health-checks and remediates matched keywords
///
/// A run is strictly sequential: follow-up search, health check, actions with
/// a fixed wait and re-check after each, then a final validation check. The
/// first action followed by a healthy re-check ends the action sequence.
pub struct RemediationEngine {
    search: SearchClient,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
    /// Index pattern used for the follow-up search
    index_pattern: String,
    action_delay: Duration,
    cooldown: Option<RemediationCooldown>,
}

impl RemediationEngine {
    pub fn new(
        search: SearchClient,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
        index_pattern: String,
    ) -> Self {
        Self {
            search,
            runner,
            clock,
            index_pattern,
            action_delay: DEFAULT_ACTION_DELAY,
            cooldown: None,
        }
    }

    /// Set the wait between an action and its health re-check
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = delay;
        self
    }

    /// Suppress repeated remediation of a keyword within `window`
    pub fn with_cooldown(mut self, window: Duration) -> Self {
        self.cooldown = Some(RemediationCooldown::new(window));
        self
    }

    /// Handle a matched keyword; never fails
    pub async fn handle(&mut self, keyword: &str, rule: &KeywordRule) -> RemediationOutcome {
        if let Some(cooldown) = self.cooldown.as_mut() {
            let now = self.clock.now();
            if !cooldown.can_run(keyword, now) {
                let remaining = cooldown
                    .remaining(keyword, now)
                    .map(|d| d.num_seconds())
                    .unwrap_or_default();
                info!(
                    "Keyword '{}' was remediated recently, skipping for another {}s.",
                    keyword, remaining
                );
                return RemediationOutcome::CoolingDown;
            }
        }

        self.enter(keyword, RemediationPhase::Searching);
        let confirmations = self
            .search
            .search_by_pattern(&self.index_pattern, &rule.success_log)
            .await;

        if confirmations.is_empty() {
            debug!(
                "No entries matching '{}' for keyword '{}', nothing to do.",
                rule.success_log, keyword
            );
            self.enter(keyword, RemediationPhase::Idle);
            return RemediationOutcome::NotConfirmed;
        }
        info!("Additional logs found for keyword '{}'.", keyword);

        self.enter(keyword, RemediationPhase::CheckingHealth);
        let health = self.runner.run(&rule.healthcheck).await;

        let outcome = if health.is_healthy() {
            info!(
                "Health check output: {}",
                health.output.as_deref().unwrap_or_default().trim_end()
            );
            info!("Keyword '{}' is already healthy, skipping actions.", keyword);
            RemediationOutcome::AlreadyHealthy
        } else {
            self.run_actions(keyword, rule).await
        };

        self.validate(keyword, rule).await;

        if outcome.actions_ran() {
            let now = self.clock.now();
            if let Some(cooldown) = self.cooldown.as_mut() {
                cooldown.record_run(keyword, now);
            }
        }

        self.enter(keyword, RemediationPhase::Idle);
        outcome
    }

    /// Run actions in order until one is followed by a healthy check
    async fn run_actions(&self, keyword: &str, rule: &KeywordRule) -> RemediationOutcome {
        if rule.actions.is_empty() {
            warn!("Keyword '{}' is unhealthy but has no actions configured.", keyword);
        }

        for (index, RemediationAction { action }) in rule.actions.iter().enumerate() {
            self.enter(keyword, RemediationPhase::RunningAction);
            info!("Performing action: {}", action);
            let result = self.runner.run(action).await;
            if !result.succeeded {
                warn!("Action '{}' exited unsuccessfully.", action);
            }

            self.clock.sleep(self.action_delay).await;

            self.enter(keyword, RemediationPhase::CheckingHealth);
            let health = self.runner.run(&rule.healthcheck).await;
            if health.is_healthy() {
                info!(
                    "Health check output: {}",
                    health.output.as_deref().unwrap_or_default().trim_end()
                );
                info!("Action '{}' completed successfully.", action);
                return RemediationOutcome::Recovered {
                    action: action.clone(),
                    attempts: index + 1,
                };
            }
            warn!("Action '{}' did not complete as expected.", action);
        }

        RemediationOutcome::Unresolved {
            attempts: rule.actions.len(),
        }
    }

    /// Final informational health check
    async fn validate(&self, keyword: &str, rule: &KeywordRule) {
        self.enter(keyword, RemediationPhase::Validating);
        info!("Validating recovery for keyword '{}'.", keyword);

        let validation = self.runner.run(&rule.healthcheck).await;
        if validation.is_healthy() {
            info!(
                "Service is healthy after recovery: {}",
                validation.output.as_deref().unwrap_or_default().trim_end()
            );
        } else {
            warn!("Service is not healthy after recovery.");
        }
    }

    fn enter(&self, keyword: &str, phase: RemediationPhase) {
        debug!("Remediation of '{}' -> {}", keyword, phase);
    }
}
