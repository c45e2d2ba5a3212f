//! Clock, task state machine, agent controller, and run loop for the
//! carrybot simulation.
//!
//! This crate owns the per-tick control loop that drives the agent through
//! fetch, carry, drop, and charge, and the async runner that paces it.
//!
//! # Modules
//!
//! - [`clock`] -- Fixed-step simulation clock.
//! - [`config`] -- Configuration loading from `carrybot.yaml` into
//!   strongly-typed structs.
//! - [`scheduler`] -- Deferred subtasks with resume guards.
//! - [`task`] -- Task state machine and nearest-target selection.
//! - [`charge`] -- Charging-station trigger handling and interrupts.
//! - [`controller`] -- [`AgentController`], one tick of the agent.
//! - [`tick`] -- [`Simulation`], one step of world plus agent.
//! - [`operator`] -- Shared runtime controls.
//! - [`runner`] -- Async run loop with pause, stop, and limits.
//!
//! [`AgentController`]: controller::AgentController
//! [`Simulation`]: tick::Simulation

pub mod charge;
pub mod clock;
pub mod config;
pub mod controller;
pub mod operator;
pub mod runner;
pub mod scheduler;
pub mod task;
pub mod tick;

pub use controller::{AgentController, InputCommand};
pub use operator::{OperatorState, SimulationEndReason};
pub use runner::{NoOpCallback, RunnerError, SimulationResult, TickCallback, log_simulation_end, run_simulation};
pub use tick::{Simulation, TickError, TickSummary};
