//! Charging-station trigger handling.
//!
//! The [`ChargeCoordinator`] reacts to zone crossings for the designated
//! charging station. It never changes task state itself: entering the
//! station queues an [`Interrupt::ForceCharging`] that the controller
//! drains at the start of its next tick, before any transition.
//!
//! Leaving the station only stops the charge. The task state stays
//! `Charging`, so an agent pushed out of the station early is stranded
//! until it is driven back in. Setting `resume_on_undercharged_exit`
//! queues an [`Interrupt::AbandonCharge`] instead, which returns the agent
//! to `Idle`.

use std::collections::VecDeque;

use carrybot_agent::BatteryModel;
use carrybot_types::{AgentEvent, ZoneEvent, ZoneId, ZoneTransition};
use carrybot_world::MotionProxy;
use tracing::{info, warn};

/// A request to preempt the task state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Enter `Charging` from whatever state the agent is in.
    ForceCharging,
    /// Leave `Charging` for `Idle` after an early exit.
    AbandonCharge,
}

/// Charging-station zone handler and interrupt queue.
#[derive(Debug, Clone)]
pub struct ChargeCoordinator {
    station: Option<ZoneId>,
    queue: VecDeque<Interrupt>,
    resume_on_undercharged_exit: bool,
}

impl ChargeCoordinator {
    /// Watch `station`. With no station, every zone event is ignored.
    pub const fn new(station: Option<ZoneId>, resume_on_undercharged_exit: bool) -> Self {
        Self {
            station,
            queue: VecDeque::new(),
            resume_on_undercharged_exit,
        }
    }

    /// The designated station.
    pub const fn station(&self) -> Option<ZoneId> {
        self.station
    }

    /// React to a zone crossing. Events for other zones are ignored.
    pub fn on_zone_event<M: MotionProxy + ?Sized>(
        &mut self,
        event: ZoneEvent,
        battery: &mut BatteryModel,
        motion: &mut M,
        events: &mut Vec<AgentEvent>,
    ) {
        if self.station != Some(event.zone) {
            return;
        }
        match event.transition {
            ZoneTransition::Enter => {
                battery.set_charging(true);
                motion.stop();
                self.queue.push_back(Interrupt::ForceCharging);
                info!(zone = %event.zone, level = battery.level(), "charging started");
                events.push(AgentEvent::ChargingStarted);
            }
            ZoneTransition::Exit => {
                battery.set_charging(false);
                let level = battery.level();
                events.push(AgentEvent::ChargingStopped { level });
                if level < battery.max() {
                    if self.resume_on_undercharged_exit {
                        info!(level, "left station before full, resuming work");
                        self.queue.push_back(Interrupt::AbandonCharge);
                    } else {
                        warn!(level, max = battery.max(), "left station before full, agent stays in charging state");
                    }
                }
            }
        }
    }

    /// Take every queued interrupt in arrival order.
    pub fn drain(&mut self) -> Vec<Interrupt> {
        self.queue.drain(..).collect()
    }

    /// Whether an interrupt is waiting.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }
}
