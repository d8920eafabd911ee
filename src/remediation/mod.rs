/// Remediation sequencing for matched keywords
pub mod engine;

/// Per-keyword remediation cooldown
pub mod cooldown;

pub use cooldown::RemediationCooldown;
pub use engine::{RemediationEngine, RemediationOutcome, RemediationPhase, DEFAULT_ACTION_DELAY};
