//! Battery drain and recharge with edge-triggered notifications.
//!
//! The [`BatteryModel`] is advanced once per tick with the elapsed time
//! and whether the agent is moving. It never changes task state itself;
//! it reports edges and the controller decides what they mean.
//!
//! # Rules
//!
//! - Not charging and moving: drain at `drain_rate`, clamped at zero.
//! - Charging below max: charge at `charge_rate`, clamped at max.
//! - Reaching max while charging (or charging while already at max) clears
//!   the low flag and the charging flag and reports [`BatteryEdge::FullyCharged`].
//! - The low edge fires once when the level falls to the threshold while
//!   the low flag is clear; it re-arms only after a full charge.

use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;

/// Something the controller must react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BatteryEdge {
    /// The level crossed the low threshold.
    LowBattery {
        /// Level at the moment of crossing.
        level: f64,
    },
    /// Charging brought the level to max.
    FullyCharged,
}

/// Charge state of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryModel {
    level: f64,
    max: f64,
    drain_rate: f64,
    charge_rate: f64,
    low_threshold: f64,
    low: bool,
    charging: bool,
}

impl BatteryModel {
    /// Build from tunables. The starting level is clamped into `[0, max]`.
    pub fn from_config(config: &AgentConfig) -> Self {
        let max = config.max_battery.max(0.0);
        Self {
            level: config.starting_battery.clamp(0.0, max),
            max,
            drain_rate: config.drain_rate,
            charge_rate: config.charge_rate,
            low_threshold: config.low_battery_threshold(),
            low: false,
            charging: false,
        }
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f64, moving: bool) -> Option<BatteryEdge> {
        if !self.charging {
            if !moving {
                return None;
            }
            self.level = (self.level - self.drain_rate * dt).max(0.0);
            if !self.low && self.level <= self.low_threshold {
                self.low = true;
                return Some(BatteryEdge::LowBattery { level: self.level });
            }
            return None;
        }

        if self.level < self.max {
            self.level = self.charge_rate.mul_add(dt, self.level).min(self.max);
        }
        if self.level >= self.max {
            self.level = self.max;
            self.low = false;
            self.charging = false;
            return Some(BatteryEdge::FullyCharged);
        }
        None
    }

    /// Overwrite the level, clamped into `[0, max]`. Flags are untouched.
    pub fn set_level(&mut self, level: f64) {
        self.level = level.clamp(0.0, self.max);
    }

    /// Start or stop accruing charge.
    pub const fn set_charging(&mut self, charging: bool) {
        self.charging = charging;
    }

    /// Whether the battery is accruing charge.
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// Whether the low flag is raised.
    pub const fn is_low(&self) -> bool {
        self.low
    }

    /// Current charge.
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Capacity.
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Level at or below which the low edge fires.
    pub const fn low_threshold(&self) -> f64 {
        self.low_threshold
    }
}
