//! Error types for the `carrybot-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use carrybot_types::{ObjectId, ZoneId};

/// Errors that can occur while building or querying the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An object was not found in the world.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// A trigger volume was not found in the world.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// The layout description cannot produce a usable world.
    #[error("invalid layout: {reason}")]
    InvalidLayout {
        /// Explanation of what is wrong with the layout.
        reason: String,
    },
}
