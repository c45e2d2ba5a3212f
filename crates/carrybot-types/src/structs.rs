//! Snapshot structs for observing agent state from outside the controller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::TaskState;
use crate::geometry::Vec3;
use crate::ids::{AgentId, ObjectId};

/// Point-in-time view of the agent, safe to log or serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identity.
    pub agent_id: AgentId,
    /// Simulated seconds since start.
    pub elapsed_secs: f64,
    /// Current position reported by the motion proxy.
    pub position: Vec3,
    /// Current task state.
    pub task_state: TaskState,
    /// Battery charge in `[0, max_battery]`.
    pub battery_level: f64,
    /// Configured maximum charge.
    pub max_battery: f64,
    /// Whether the low-battery flag is raised.
    pub battery_low: bool,
    /// Object attached to the hold point, if any.
    pub held_object: Option<ObjectId>,
    /// Objects permanently excluded from pickup.
    pub delivered: BTreeSet<ObjectId>,
    /// Whether manual override is active.
    pub manual_override: bool,
    /// Whether the agent is accruing charge.
    pub is_charging: bool,
    /// Whether the agent stands inside the drop zone.
    pub in_drop_zone: bool,
    /// Timed subtasks still waiting for their due time.
    pub pending_subtasks: usize,
}

impl AgentSnapshot {
    /// Battery level as a fraction of the maximum (0.0 -- 1.0).
    pub fn battery_fraction(&self) -> f64 {
        if self.max_battery <= 0.0 {
            0.0
        } else {
            self.battery_level / self.max_battery
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot() -> AgentSnapshot {
        AgentSnapshot {
            agent_id: AgentId::new(),
            elapsed_secs: 1.5,
            position: Vec3::new(1.0, 0.0, 2.0),
            task_state: TaskState::MovingToPickup,
            battery_level: 40.0,
            max_battery: 80.0,
            battery_low: false,
            held_object: None,
            delivered: BTreeSet::from([ObjectId::new()]),
            manual_override: false,
            is_charging: false,
            in_drop_zone: false,
            pending_subtasks: 0,
        }
    }

    #[test]
    fn battery_fraction_uses_max() {
        let snap = snapshot();
        assert!((snap.battery_fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn snapshot_serializes_state_name() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(json["task_state"], "MovingToPickup");
        assert_eq!(json["delivered"].as_array().map(Vec::len), Some(1));
    }
}
