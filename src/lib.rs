/// Error types for the remediation monitor
pub mod error;

/// Log entries and command results
pub mod events;

/// Configuration management
pub mod config;

/// Time source abstraction
pub mod clock;

/// Error query construction and search backend client
pub mod search;

/// Command execution for health checks and remediation actions
pub mod commands;

/// Keyword matching of log messages
pub mod triggers;

/// Remediation sequencing and cooldown
pub mod remediation;

/// Polling loop tying everything together
pub mod monitor;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use error::{CommandError, ConfigError, SearchError};
