//! Events emitted by the world and the agent controller.
//!
//! [`ZoneEvent`]s flow from the world into the controller. [`AgentEvent`]s
//! flow out of the controller into tick summaries, where tests and the
//! engine inspect what happened during a tick.

use serde::{Deserialize, Serialize};

use crate::enums::{SubtaskKind, TaskState, ZoneKind, ZoneTransition};
use crate::geometry::Vec3;
use crate::ids::{ObjectId, ZoneId};

/// The agent crossed the boundary of a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEvent {
    /// The volume that was crossed.
    pub zone: ZoneId,
    /// What kind of volume it is.
    pub kind: ZoneKind,
    /// Whether the agent entered or left.
    pub transition: ZoneTransition,
}

/// Something observable that happened to the agent during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// The task state machine moved between states.
    StateChanged {
        /// Previous state.
        from: TaskState,
        /// New state.
        to: TaskState,
    },
    /// The charging-zone override forced the agent into `Charging`.
    ChargingOverride {
        /// State that was interrupted.
        interrupted: TaskState,
    },
    /// Battery crossed the low threshold (fires once per discharge).
    LowBattery {
        /// Level at the moment the edge fired.
        level: f64,
    },
    /// Battery reached its maximum while charging.
    FullyCharged,
    /// The agent started accruing charge.
    ChargingStarted,
    /// The agent stopped accruing charge before reaching full.
    ChargingStopped {
        /// Level when charging stopped.
        level: f64,
    },
    /// The agent was asked to drive to the charging station.
    HeadingToStation {
        /// Station position.
        destination: Vec3,
    },
    /// A pickup was selected as the next target.
    TargetSelected {
        /// The chosen pickup.
        object: ObjectId,
        /// Its position at selection time.
        position: Vec3,
    },
    /// Target selection found nothing to fetch.
    NoTargetFound,
    /// An object was attached to the hold point.
    Grasped {
        /// The grasped object.
        object: ObjectId,
    },
    /// A grasp attempt found nothing (or was blocked).
    GraspMiss,
    /// The held object was released.
    Released {
        /// The released object.
        object: ObjectId,
        /// Whether the release scored a delivery.
        scored: bool,
    },
    /// An object was added to the delivered set.
    Delivered {
        /// The delivered object.
        object: ObjectId,
    },
    /// A timed subtask reached its due time.
    SubtaskCompleted {
        /// Which subtask finished.
        kind: SubtaskKind,
        /// Whether its state transition still applied at resume time.
        relevant: bool,
    },
    /// Manual override was switched on or off.
    ManualModeChanged {
        /// New manual-override setting.
        enabled: bool,
    },
    /// The agent entered or left the drop zone.
    DropZoneChanged {
        /// Whether the agent is now inside.
        inside: bool,
    },
}
