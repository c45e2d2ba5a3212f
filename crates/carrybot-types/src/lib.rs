//! Shared type definitions for the carrybot simulation.
//!
//! Every crate in the workspace speaks in these types: identifiers,
//! geometry, task states, and the events that cross crate boundaries.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, objects, and zones
//! - [`geometry`] -- `Vec3`/`Vec2` and scalar helpers
//! - [`enums`] -- Task states, tags, zone kinds, subtask kinds
//! - [`events`] -- Zone crossings and agent events
//! - [`structs`] -- Serializable agent snapshot

pub mod enums;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{SubtaskKind, Tag, TaskState, ZoneKind, ZoneTransition};
pub use events::{AgentEvent, ZoneEvent};
pub use geometry::{Vec2, Vec3};
pub use ids::{AgentId, ObjectId, ZoneId};
pub use structs::AgentSnapshot;
