//! Error types for the `carrybot-agent` crate.
//!
//! Agent components never fail at runtime; a bad grasp or an empty
//! release is an event, not an error. What can fail is construction from
//! tunables that make no physical sense.

/// Errors that can occur while building agent components.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A tunable is outside its allowed range.
    #[error("invalid agent config: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A lift platform description is unusable.
    #[error("invalid lift platform: {reason}")]
    InvalidPlatform {
        /// What is wrong with it.
        reason: String,
    },
}
