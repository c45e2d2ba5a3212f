//! Tunables for one agent: battery, motion, grasping, and policy knobs.
//!
//! [`AgentConfig`] is read from the `agent` section of `carrybot.yaml`;
//! every field has a default so a partial section is fine. Call
//! [`AgentConfig::validate`] before building components from it.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Lower bound for a runtime move-speed change.
pub const MIN_MOVE_SPEED: f64 = 0.1;

/// Upper bound for a runtime move-speed change.
pub const MAX_MOVE_SPEED: f64 = 10.0;

/// When a completed drop adds the released object to the delivered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Every object released by a drop subtask counts as delivered, even
    /// when the release happens outside the drop zone.
    #[default]
    Unconditional,
    /// Only releases inside the drop zone count as delivered.
    RequireDropZone,
}

/// Every tunable the agent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    // --- Battery ---
    /// Battery capacity (default: 100).
    #[serde(default = "default_max_battery")]
    pub max_battery: f64,
    /// Charge at start-up, clamped into `[0, max_battery]` (default: 100).
    #[serde(default = "default_max_battery")]
    pub starting_battery: f64,
    /// Charge lost per second while moving (default: 5).
    #[serde(default = "default_drain_rate")]
    pub drain_rate: f64,
    /// Charge gained per second while charging (default: 10).
    #[serde(default = "default_charge_rate")]
    pub charge_rate: f64,
    /// Fraction of `max_battery` at or below which the low edge fires
    /// (default: 0.2).
    #[serde(default = "default_low_battery_fraction")]
    pub low_battery_fraction: f64,

    // --- Motion ---
    /// Manual and autonomous driving speed in units per second (default: 3.5).
    #[serde(default = "default_move_speed")]
    pub move_speed: f64,
    /// Manual turning speed in degrees per second (default: 180).
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f64,
    /// Remaining distance at which a path counts as finished (default: 0.2).
    #[serde(default = "default_arrive_threshold")]
    pub arrive_threshold: f64,
    /// Largest distance the start-up snap may move the agent (default: 2).
    #[serde(default = "default_navmesh_snap_distance")]
    pub navmesh_snap_distance: f64,
    /// Manual input magnitude above which the agent counts as moving.
    #[serde(default = "default_input_moving_threshold")]
    pub input_moving_threshold: f64,
    /// Autonomous speed above which the agent counts as moving (default: 0.1).
    #[serde(default = "default_velocity_moving_threshold")]
    pub velocity_moving_threshold: f64,

    // --- Grasping ---
    /// Length of the upward grasp probe (default: 2).
    #[serde(default = "default_pickup_range")]
    pub pickup_range: f64,
    /// Seconds after a release before another grasp may succeed (default: 1.5).
    #[serde(default = "default_pickup_cooldown_secs")]
    pub pickup_cooldown_secs: f64,
    /// Seconds between arriving at a pickup and the grasp attempt (default: 0.75).
    #[serde(default = "default_lift_delay_secs")]
    pub lift_delay_secs: f64,
    /// Seconds between arriving at the drop zone and the release (default: 0.75).
    #[serde(default = "default_drop_delay_secs")]
    pub drop_delay_secs: f64,
    /// How far forward a released object is pushed (default: 0.5).
    #[serde(default = "default_release_offset")]
    pub release_offset: f64,
    /// How far below the hold point the probe starts (default: 0.3).
    #[serde(default = "default_probe_drop")]
    pub probe_drop: f64,
    /// Height of the hold point above the agent's origin (default: 0.5).
    #[serde(default = "default_hold_height")]
    pub hold_height: f64,
    /// Distance of the hold point ahead of the agent's origin (default: 0.25).
    #[serde(default = "default_hold_forward")]
    pub hold_forward: f64,

    // --- Policy ---
    /// Which releases count as delivered.
    #[serde(default)]
    pub delivery_policy: DeliveryPolicy,
    /// Return to `Idle` instead of driving to the drop zone after a grasp
    /// miss (default: off).
    #[serde(default)]
    pub skip_drop_on_grasp_miss: bool,
    /// Leave `Charging` for `Idle` when the agent exits the station before
    /// it is full (default: off).
    #[serde(default)]
    pub resume_on_undercharged_exit: bool,
}

fn default_max_battery() -> f64 {
    100.0
}

fn default_drain_rate() -> f64 {
    5.0
}

fn default_charge_rate() -> f64 {
    10.0
}

fn default_low_battery_fraction() -> f64 {
    0.2
}

fn default_move_speed() -> f64 {
    3.5
}

fn default_turn_speed() -> f64 {
    180.0
}

fn default_arrive_threshold() -> f64 {
    0.2
}

fn default_navmesh_snap_distance() -> f64 {
    2.0
}

fn default_input_moving_threshold() -> f64 {
    0.01
}

fn default_velocity_moving_threshold() -> f64 {
    0.1
}

fn default_pickup_range() -> f64 {
    2.0
}

fn default_pickup_cooldown_secs() -> f64 {
    1.5
}

fn default_lift_delay_secs() -> f64 {
    0.75
}

fn default_drop_delay_secs() -> f64 {
    0.75
}

fn default_release_offset() -> f64 {
    0.5
}

fn default_probe_drop() -> f64 {
    0.3
}

fn default_hold_height() -> f64 {
    0.5
}

fn default_hold_forward() -> f64 {
    0.25
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_battery: default_max_battery(),
            starting_battery: default_max_battery(),
            drain_rate: default_drain_rate(),
            charge_rate: default_charge_rate(),
            low_battery_fraction: default_low_battery_fraction(),
            move_speed: default_move_speed(),
            turn_speed: default_turn_speed(),
            arrive_threshold: default_arrive_threshold(),
            navmesh_snap_distance: default_navmesh_snap_distance(),
            input_moving_threshold: default_input_moving_threshold(),
            velocity_moving_threshold: default_velocity_moving_threshold(),
            pickup_range: default_pickup_range(),
            pickup_cooldown_secs: default_pickup_cooldown_secs(),
            lift_delay_secs: default_lift_delay_secs(),
            drop_delay_secs: default_drop_delay_secs(),
            release_offset: default_release_offset(),
            probe_drop: default_probe_drop(),
            hold_height: default_hold_height(),
            hold_forward: default_hold_forward(),
            delivery_policy: DeliveryPolicy::default(),
            skip_drop_on_grasp_miss: false,
            resume_on_undercharged_exit: false,
        }
    }
}

impl AgentConfig {
    /// Battery level at or below which the low edge fires.
    pub fn low_battery_threshold(&self) -> f64 {
        self.max_battery * self.low_battery_fraction
    }

    /// Check every tunable is in range.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AgentError> {
        positive("max_battery", self.max_battery)?;
        positive("move_speed", self.move_speed)?;
        positive("pickup_range", self.pickup_range)?;
        non_negative("starting_battery", self.starting_battery)?;
        non_negative("drain_rate", self.drain_rate)?;
        non_negative("charge_rate", self.charge_rate)?;
        non_negative("turn_speed", self.turn_speed)?;
        non_negative("arrive_threshold", self.arrive_threshold)?;
        non_negative("navmesh_snap_distance", self.navmesh_snap_distance)?;
        non_negative("input_moving_threshold", self.input_moving_threshold)?;
        non_negative("velocity_moving_threshold", self.velocity_moving_threshold)?;
        non_negative("pickup_cooldown_secs", self.pickup_cooldown_secs)?;
        non_negative("lift_delay_secs", self.lift_delay_secs)?;
        non_negative("drop_delay_secs", self.drop_delay_secs)?;
        non_negative("release_offset", self.release_offset)?;
        non_negative("probe_drop", self.probe_drop)?;

        if !(0.0..=1.0).contains(&self.low_battery_fraction) {
            return Err(AgentError::InvalidConfig {
                field: "low_battery_fraction",
                reason: format!("must be within [0, 1], got {}", self.low_battery_fraction),
            });
        }
        Ok(())
    }

    /// Change the move speed at runtime, clamped to
    /// [`MIN_MOVE_SPEED`]..=[`MAX_MOVE_SPEED`]. Returns the applied value.
    pub fn set_move_speed(&mut self, speed: f64) -> f64 {
        self.move_speed = clamp_move_speed(speed);
        self.move_speed
    }
}

/// Clamp a requested move speed into the allowed range.
///
/// NaN falls back to the minimum.
pub fn clamp_move_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        MIN_MOVE_SPEED
    } else {
        speed.clamp(MIN_MOVE_SPEED, MAX_MOVE_SPEED)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), AgentError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AgentError::InvalidConfig {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), AgentError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AgentError::InvalidConfig {
            field,
            reason: format!("must be non-negative, got {value}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AgentConfig::default();
        assert!(cfg.validate().is_ok());
        assert!((cfg.low_battery_threshold() - 20.0).abs() < 1e-9);
        assert!((cfg.pickup_cooldown_secs - 1.5).abs() < 1e-9);
        assert_eq!(cfg.delivery_policy, DeliveryPolicy::Unconditional);
        assert!(!cfg.skip_drop_on_grasp_miss);
        assert!(!cfg.resume_on_undercharged_exit);
    }

    #[test]
    fn rejects_bad_fields() {
        let cfg = AgentConfig {
            max_battery: 0.0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AgentError::InvalidConfig { field: "max_battery", .. })
        ));

        let cfg = AgentConfig {
            low_battery_fraction: 1.5,
            ..AgentConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AgentError::InvalidConfig { field: "low_battery_fraction", .. })
        ));

        let cfg = AgentConfig {
            drain_rate: -1.0,
            ..AgentConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn move_speed_is_clamped() {
        let mut cfg = AgentConfig::default();
        assert!((cfg.set_move_speed(50.0) - MAX_MOVE_SPEED).abs() < 1e-9);
        assert!((cfg.set_move_speed(0.0) - MIN_MOVE_SPEED).abs() < 1e-9);
        assert!((cfg.set_move_speed(4.0) - 4.0).abs() < 1e-9);
        assert!((clamp_move_speed(f64::NAN) - MIN_MOVE_SPEED).abs() < 1e-9);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "max_battery: 80.0\ndelivery_policy: require_drop_zone\n";
        let cfg: AgentConfig = serde_yml::from_str(yaml).unwrap();
        assert!((cfg.max_battery - 80.0).abs() < 1e-9);
        assert!((cfg.move_speed - 3.5).abs() < 1e-9);
        assert_eq!(cfg.delivery_policy, DeliveryPolicy::RequireDropZone);
    }
}
