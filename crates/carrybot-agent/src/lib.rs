//! Agent components for the carrybot simulation.
//!
//! Each component owns one slice of agent state and is driven by the
//! controller in `carrybot-core`. None of them changes task state; they
//! report what happened and the controller decides.
//!
//! # Modules
//!
//! - [`battery`] -- Drain, recharge, and low/full edges.
//! - [`config`] -- [`AgentConfig`] tunables and [`DeliveryPolicy`].
//! - [`error`] -- Construction errors.
//! - [`grasp`] -- Hold-point grasping, release, and pickup cooldown.
//! - [`lift`] -- Two-height lift platforms that carry a load.

pub mod battery;
pub mod config;
pub mod error;
pub mod grasp;
pub mod lift;

// Re-export primary types at crate root.
pub use battery::{BatteryEdge, BatteryModel};
pub use config::{AgentConfig, DeliveryPolicy, MAX_MOVE_SPEED, MIN_MOVE_SPEED, clamp_move_speed};
pub use error::AgentError;
pub use grasp::{GraspController, GraspMiss, GraspOutcome, Release};
pub use lift::LiftPlatform;
