//! The world the carrybot agent lives in.
//!
//! This crate defines the seams the agent controller talks through and a
//! deterministic reference world that implements them.
//!
//! # Modules
//!
//! - [`contract`] -- [`MotionProxy`], [`WorldQuery`], and [`Scorekeeper`]
//!   traits plus the [`LayerMask`] used by ray probes.
//! - [`error`] -- Error types for world construction and lookups.
//! - [`sandbox`] -- [`SandboxWorld`], a flat kinematic arena with spherical
//!   bodies and straight-line autonomous motion.
//! - [`scoreboard`] -- [`Scoreboard`]: running score, best score, and the
//!   round timer.
//! - [`starting_world`] -- Seeded arena layout from a [`LayoutConfig`].
//! - [`zone`] -- Trigger volumes and enter/exit tracking.

pub mod contract;
pub mod error;
pub mod sandbox;
pub mod scoreboard;
pub mod starting_world;
pub mod zone;

// Re-export primary types at crate root.
pub use contract::{LayerMask, MotionProxy, Scorekeeper, WorldQuery};
pub use error::WorldError;
pub use sandbox::{Body, SandboxWorld};
pub use scoreboard::{DEFAULT_ROUND_SECS, Scoreboard};
pub use starting_world::{
    LayoutConfig, PlatformLayout, StartingLayoutIds, ZoneLayout, create_starting_world,
};
pub use zone::{Zone, ZoneSet};
