//! Tick callback that turns agent events into structured log lines.
//!
//! State changes and deliveries are logged at `info`, battery trouble and
//! overrides at `warn`, everything else at `debug`. A running tally is
//! kept for the shutdown summary.

use carrybot_core::{Simulation, TickCallback, TickSummary};
use carrybot_types::AgentEvent;
use tracing::{debug, info, warn};

/// Counts of notable events seen during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventTally {
    /// Objects added to the delivered set.
    pub deliveries: u64,
    /// Releases that scored.
    pub scored_releases: u64,
    /// Low-battery edges.
    pub low_battery: u64,
    /// Charging-station overrides.
    pub overrides: u64,
    /// Full charges.
    pub full_charges: u64,
}

/// Callback logging every agent event.
#[derive(Debug, Default)]
pub struct EventLogCallback {
    tally: EventTally,
}

impl EventLogCallback {
    /// Create a callback with an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts so far.
    pub const fn tally(&self) -> EventTally {
        self.tally
    }

    fn record(&mut self, tick: u64, event: &AgentEvent) {
        match event {
            AgentEvent::StateChanged { from, to } => {
                info!(tick, from = %from, to = %to, "task state changed");
            }
            AgentEvent::Delivered { object } => {
                self.tally.deliveries = self.tally.deliveries.saturating_add(1);
                info!(tick, object_id = %object, "object delivered");
            }
            AgentEvent::Released { object, scored } => {
                if *scored {
                    self.tally.scored_releases = self.tally.scored_releases.saturating_add(1);
                }
                debug!(tick, object_id = %object, scored, "object released");
            }
            AgentEvent::LowBattery { level } => {
                self.tally.low_battery = self.tally.low_battery.saturating_add(1);
                warn!(tick, level, "low battery");
            }
            AgentEvent::ChargingOverride { interrupted } => {
                self.tally.overrides = self.tally.overrides.saturating_add(1);
                warn!(tick, interrupted = %interrupted, "task interrupted by charging station");
            }
            AgentEvent::FullyCharged => {
                self.tally.full_charges = self.tally.full_charges.saturating_add(1);
                info!(tick, "fully charged");
            }
            other => debug!(tick, event = ?other, "agent event"),
        }
    }
}

impl TickCallback for EventLogCallback {
    fn on_tick(&mut self, summary: &TickSummary, _sim: &Simulation) {
        for event in &summary.events {
            self.record(summary.tick, event);
        }
        if summary.round_over {
            info!(tick = summary.tick, score = summary.score, "round finished");
        }
    }
}
