//! Keyword trigger matching
//!
//! Decides which configured keyword rule, if any, a log message triggers.

use crate::config::KeywordRule;
use std::collections::BTreeMap;

/// Matches log messages against the configured keyword rules
///
/// Keywords are tried in lexical order and the first keyword that occurs in
/// the message wins. Matching is exact, case-sensitive substring containment.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    rules: BTreeMap<String, KeywordRule>,
}

impl KeywordMatcher {
    pub fn new(rules: BTreeMap<String, KeywordRule>) -> Self {
        Self { rules }
    }

    /// Find the rule triggered by `message`
    pub fn find_match(&self, message: &str) -> Option<(&str, &KeywordRule)> {
        self.rules
            .iter()
            .find(|(keyword, _)| message.contains(keyword.as_str()))
            .map(|(keyword, rule)| (keyword.as_str(), rule))
    }

    /// Number of configured keyword rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
