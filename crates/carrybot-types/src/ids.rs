//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agents, world objects, and zones each get their own identifier type so
//! a zone id can never be handed to a grasp query by accident. All IDs use
//! UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares one id newtype with its conversions.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The wrapped [`Uuid`].
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(raw: Uuid) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for Uuid {
            fn from(wrapped: $name) -> Self {
                wrapped.0
            }
        }
    };
}

define_id! {
    /// The controlled agent.
    AgentId
}

define_id! {
    /// A physical object: a pickup or a platform load.
    ObjectId
}

define_id! {
    /// A trigger volume such as the charging station or a drop zone.
    ZoneId
}
