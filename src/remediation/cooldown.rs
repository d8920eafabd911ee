use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Per-keyword cooldown for remediation runs
///
/// Tracks when each keyword was last remediated and refuses a new run until
/// the cooldown window has passed. A zero window never blocks.
#[derive(Debug)]
pub struct RemediationCooldown {
    /// Minimum time between two runs of the same keyword
    window: Duration,
    /// Last remediation time per keyword
    last_run: HashMap<String, DateTime<Utc>>,
}

impl RemediationCooldown {
    /// Create a cooldown with the given window
    ///
    /// # Arguments
    ///
    /// * `window` - Minimum time between two remediation runs of a keyword
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            window: Duration::from_std(window).unwrap_or(Duration::MAX),
            last_run: HashMap::new(),
        }
    }

    /// Check whether `keyword` may be remediated at `now`
    ///
    /// # Returns
    ///
    /// `true` if no run was recorded inside the window, `false` otherwise
    pub fn can_run(&mut self, keyword: &str, now: DateTime<Utc>) -> bool {
        self.cleanup_expired(now);
        !self.last_run.contains_key(keyword)
    }

    /// Record that `keyword` was remediated at `now`
    pub fn record_run(&mut self, keyword: &str, now: DateTime<Utc>) {
        self.last_run.insert(keyword.to_string(), now);
    }

    /// Time left before `keyword` may run again, if it is cooling down
    pub fn remaining(&self, keyword: &str, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_run.get(keyword)?;
        let until = last.checked_add_signed(self.window)?;
        (until > now).then(|| until - now)
    }

    /// Number of keywords currently cooling down
    pub fn active_count(&mut self, now: DateTime<Utc>) -> usize {
        self.cleanup_expired(now);
        self.last_run.len()
    }

    /// Drop records whose window has elapsed
    fn cleanup_expired(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.last_run.retain(|_, &mut last| match last.checked_add_signed(window) {
            Some(until) => until > now,
            None => true,
        });
    }
}
