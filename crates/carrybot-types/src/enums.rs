//! Enumeration types shared across the carrybot workspace.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the fetch-and-deliver task loop.
///
/// The loop is cyclic; there is no terminal state. `Charging` can be
/// entered from any state through the charging-zone override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting for the next decision.
    #[default]
    Idle,
    /// Choosing the nearest undelivered pickup.
    SeekingTarget,
    /// Driving to the chosen pickup.
    MovingToPickup,
    /// Lift sequence in progress (grasp pending).
    LiftingBox,
    /// Carrying toward the drop zone.
    MovingToDropZone,
    /// Drop sequence in progress (release pending).
    DroppingBox,
    /// Waiting at (or heading to) the charging station.
    Charging,
}

impl TaskState {
    /// States in which the agent may legitimately hold an object.
    pub const fn may_hold_object(self) -> bool {
        matches!(
            self,
            Self::LiftingBox | Self::MovingToDropZone | Self::DroppingBox
        )
    }
}

impl core::fmt::Display for TaskState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SeekingTarget => "seeking_target",
            Self::MovingToPickup => "moving_to_pickup",
            Self::LiftingBox => "lifting_box",
            Self::MovingToDropZone => "moving_to_drop_zone",
            Self::DroppingBox => "dropping_box",
            Self::Charging => "charging",
        };
        f.write_str(name)
    }
}

/// Tag attached to world objects, used by candidate and overlap queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// A box the agent can fetch and deliver.
    Pickup,
    /// A load carried by a lift platform.
    Load,
}

/// Kind of trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Charging station volume.
    ChargingStation,
    /// Delivery volume where released boxes score.
    DropZone,
}

/// Direction of a trigger-volume crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneTransition {
    /// The agent entered the volume.
    Enter,
    /// The agent left the volume.
    Exit,
}

/// Deferred sub-action kinds run by the subtask scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubtaskKind {
    /// Autonomous lift sequence ending in a grasp attempt.
    Lift,
    /// Autonomous drop sequence ending in a release.
    Drop,
    /// Manually triggered lift ending in a grasp attempt.
    ManualPickup,
    /// End of the post-release pickup cooldown.
    PickupCooldown,
}
