//! The agent controller: one tick of the fetch-and-deliver loop.
//!
//! [`AgentController`] owns every piece of per-agent state (task machine,
//! battery, grasp slot, pending subtasks, delivered set) and drives the
//! world through [`MotionProxy`] and [`WorldQuery`]. The score sink is an
//! injected [`Scorekeeper`].
//!
//! # Tick order
//!
//! 1. Advance the controller's clock.
//! 2. Drain charging interrupts (zone entry forces `Charging`).
//! 3. Complete due subtasks, re-checking their guards.
//! 4. Advance the battery and react to its edges.
//! 5. Unless charging: manual drive, or one state-machine step. The step
//!    sees the state left by steps 2-4, so a subtask that finishes in
//!    `Idle` is followed by `Idle -> SeekingTarget` in the same tick.
//! 6. Move the held object to the hold point.
//!
//! Zone events for the tick must be delivered with
//! [`on_zone_event`](AgentController::on_zone_event) before
//! [`tick`](AgentController::tick).

use std::collections::BTreeSet;

use carrybot_agent::{
    AgentConfig, AgentError, BatteryEdge, BatteryModel, DeliveryPolicy, GraspController,
    GraspOutcome,
};
use carrybot_types::{
    AgentEvent, AgentId, AgentSnapshot, ObjectId, SubtaskKind, TaskState, Vec2, Vec3, ZoneEvent,
    ZoneId, ZoneKind, ZoneTransition,
};
use carrybot_world::{MotionProxy, Scorekeeper, WorldQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::charge::{ChargeCoordinator, Interrupt};
use crate::scheduler::{PendingSubtask, ResumeGuard, SubtaskScheduler};
use crate::task::TaskStateMachine;

/// A manual control input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputCommand {
    /// Switch manual override on or off.
    ToggleManual,
    /// Set the manual move vector: `x` turns, `y` drives.
    Move(Vec2),
    /// Start a manual grasp (completes after the lift delay).
    Grasp,
    /// Release the held object immediately.
    Release,
}

/// Per-agent controller generic over its score sink.
#[derive(Debug)]
pub struct AgentController<S: Scorekeeper> {
    id: AgentId,
    config: AgentConfig,
    now: f64,
    machine: TaskStateMachine,
    battery: BatteryModel,
    grasp: GraspController,
    scheduler: SubtaskScheduler,
    charge: ChargeCoordinator,
    delivered: BTreeSet<ObjectId>,
    manual_override: bool,
    move_input: Vec2,
    in_drop_zone: bool,
    /// The held object was grasped manually.
    manual_hold: bool,
    scorekeeper: S,
    events: Vec<AgentEvent>,
}

impl<S: Scorekeeper> AgentController<S> {
    /// Build an idle agent that charges at `station`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if the config fails validation.
    pub fn new(config: AgentConfig, scorekeeper: S, station: Option<ZoneId>) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            id: AgentId::new(),
            battery: BatteryModel::from_config(&config),
            grasp: GraspController::from_config(&config),
            charge: ChargeCoordinator::new(station, config.resume_on_undercharged_exit),
            config,
            now: 0.0,
            machine: TaskStateMachine::new(),
            scheduler: SubtaskScheduler::new(),
            delivered: BTreeSet::new(),
            manual_override: false,
            move_input: Vec2::ZERO,
            in_drop_zone: false,
            manual_hold: false,
            scorekeeper,
            events: Vec::new(),
        })
    }

    /// Snap the agent onto the navigable surface if it starts just off it.
    pub fn start<W: MotionProxy>(&self, world: &mut W) {
        if let Some(position) = world.snap_to_navigable(self.config.navmesh_snap_distance) {
            info!(agent_id = %self.id, x = position.x, z = position.z, "snapped onto navigable surface");
        } else if !world.is_on_navigable_surface() {
            warn!(
                agent_id = %self.id,
                max_distance = self.config.navmesh_snap_distance,
                "agent starts off the navigable surface"
            );
        }
    }

    // -----------------------------------------------------------------------
    // External inputs
    // -----------------------------------------------------------------------

    /// Deliver a zone crossing from the world.
    pub fn on_zone_event<W: MotionProxy>(&mut self, event: ZoneEvent, world: &mut W) {
        match event.kind {
            ZoneKind::ChargingStation => {
                self.charge
                    .on_zone_event(event, &mut self.battery, world, &mut self.events);
            }
            ZoneKind::DropZone => {
                let inside = event.transition == ZoneTransition::Enter;
                self.in_drop_zone = inside;
                debug!(agent_id = %self.id, inside, "drop zone crossing");
                self.events.push(AgentEvent::DropZoneChanged { inside });
            }
        }
    }

    /// Apply a manual control input.
    pub fn handle_input<W: MotionProxy + WorldQuery>(&mut self, input: InputCommand, world: &mut W) {
        match input {
            InputCommand::ToggleManual => self.toggle_manual(world),
            InputCommand::Move(vector) => self.move_input = vector,
            InputCommand::Grasp => {
                if !self.manual_override {
                    debug!("manual grasp ignored outside manual mode");
                    return;
                }
                self.scheduler.schedule(
                    SubtaskKind::ManualPickup,
                    self.now,
                    self.config.lift_delay_secs,
                    ResumeGuard::ManualMode,
                );
            }
            InputCommand::Release => {
                if !self.manual_override {
                    debug!("manual release ignored outside manual mode");
                    return;
                }
                let scored = self.in_drop_zone;
                self.release_held(world, scored);
            }
        }
    }

    /// Change the move speed, clamped to the allowed range. Returns the
    /// applied value; the caller forwards it to the motion proxy.
    pub fn set_move_speed(&mut self, speed: f64) -> f64 {
        let applied = self.config.set_move_speed(speed);
        info!(agent_id = %self.id, move_speed = applied, "move speed changed");
        applied
    }

    fn toggle_manual<W: MotionProxy + WorldQuery>(&mut self, world: &mut W) {
        self.manual_override = !self.manual_override;
        world.set_autonomy(!self.manual_override);
        if !self.manual_override {
            self.move_input = Vec2::ZERO;
            self.set_down_manual_hold(world);
            if world.is_on_navigable_surface() {
                world.stop();
            } else {
                warn!(agent_id = %self.id, "autonomy re-enabled off the navigable surface");
            }
        }
        info!(agent_id = %self.id, enabled = self.manual_override, "manual override toggled");
        self.events.push(AgentEvent::ManualModeChanged {
            enabled: self.manual_override,
        });
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the agent by `dt` seconds and return what happened.
    pub fn tick<W: MotionProxy + WorldQuery>(&mut self, dt: f64, world: &mut W) -> Vec<AgentEvent> {
        self.now += dt;

        for interrupt in self.charge.drain() {
            self.apply_interrupt(interrupt, world);
        }

        for task in self.scheduler.take_due(self.now) {
            self.complete_subtask(task, world);
        }

        let moving = self.is_moving(world);
        if let Some(edge) = self.battery.tick(dt, moving) {
            self.on_battery_edge(edge, world);
        }

        if self.machine.state() != TaskState::Charging {
            if self.manual_override {
                self.drive_manually(dt, world);
            } else {
                self.step_machine(world);
            }
        }

        let hold = self.hold_point(world);
        self.grasp.follow(hold, world);

        std::mem::take(&mut self.events)
    }

    fn is_moving<W: MotionProxy>(&self, world: &W) -> bool {
        let input = self.manual_override && self.move_input.length() > self.config.input_moving_threshold;
        input || world.velocity_magnitude() > self.config.velocity_moving_threshold
    }

    fn drive_manually<W: MotionProxy>(&self, dt: f64, world: &mut W) {
        let distance = self.move_input.y * self.config.move_speed * dt;
        let yaw = self.move_input.x * self.config.turn_speed * dt;
        world.manual_drive(distance, yaw);
    }

    fn step_machine<W: MotionProxy + WorldQuery>(&mut self, world: &mut W) {
        match self.machine.state() {
            TaskState::Idle => {
                if self.battery.is_low() {
                    self.head_to_station(world);
                    self.machine.transition(TaskState::Charging, &mut self.events);
                } else {
                    self.machine.transition(TaskState::SeekingTarget, &mut self.events);
                }
            }
            TaskState::SeekingTarget => {
                let from = world.position();
                match self.machine.select_target(from, &*world, &self.delivered) {
                    Some(target) => {
                        world.set_destination(target.position);
                        info!(object_id = %target.object, "target selected");
                        self.events.push(AgentEvent::TargetSelected {
                            object: target.object,
                            position: target.position,
                        });
                        self.machine.transition(TaskState::MovingToPickup, &mut self.events);
                    }
                    None => {
                        info!("no undelivered pickup found");
                        self.events.push(AgentEvent::NoTargetFound);
                        self.machine.transition(TaskState::Idle, &mut self.events);
                    }
                }
            }
            TaskState::MovingToPickup => {
                if world.arrived() {
                    self.machine.transition(TaskState::LiftingBox, &mut self.events);
                    self.scheduler.schedule(
                        SubtaskKind::Lift,
                        self.now,
                        self.config.lift_delay_secs,
                        ResumeGuard::RequireState(TaskState::LiftingBox),
                    );
                }
            }
            TaskState::MovingToDropZone => {
                if world.arrived() {
                    self.scheduler.schedule(
                        SubtaskKind::Drop,
                        self.now,
                        self.config.drop_delay_secs,
                        ResumeGuard::RequireState(TaskState::DroppingBox),
                    );
                    self.machine.transition(TaskState::DroppingBox, &mut self.events);
                }
            }
            TaskState::LiftingBox | TaskState::DroppingBox | TaskState::Charging => {}
        }
    }

    // -----------------------------------------------------------------------
    // Interrupts and battery edges
    // -----------------------------------------------------------------------

    fn apply_interrupt<W: MotionProxy + WorldQuery>(&mut self, interrupt: Interrupt, world: &mut W) {
        match interrupt {
            Interrupt::ForceCharging => {
                let interrupted = self.machine.state();
                // A pending drop still releases the box when it completes.
                if !self.manual_hold && !self.scheduler.has_pending(SubtaskKind::Drop) {
                    self.release_held(world, false);
                }
                warn!(agent_id = %self.id, interrupted = %interrupted, "charging station override");
                self.events.push(AgentEvent::ChargingOverride { interrupted });
                self.machine.transition(TaskState::Charging, &mut self.events);
            }
            Interrupt::AbandonCharge => {
                if self.machine.state() == TaskState::Charging {
                    self.machine.transition(TaskState::Idle, &mut self.events);
                }
            }
        }
    }

    fn on_battery_edge<W: MotionProxy + WorldQuery>(&mut self, edge: BatteryEdge, world: &mut W) {
        match edge {
            BatteryEdge::LowBattery { level } => {
                warn!(agent_id = %self.id, level, "battery low");
                self.events.push(AgentEvent::LowBattery { level });
                self.head_to_station(world);
            }
            BatteryEdge::FullyCharged => {
                info!(agent_id = %self.id, level = self.battery.level(), "fully charged");
                if self.machine.state() == TaskState::Charging {
                    self.machine.transition(TaskState::Idle, &mut self.events);
                }
                self.scorekeeper.notify_agent_ready(self.id);
                self.events.push(AgentEvent::FullyCharged);
            }
        }
    }

    /// Drop manual control and path to the charging station.
    fn head_to_station<W: MotionProxy + WorldQuery>(&mut self, world: &mut W) {
        if self.manual_override {
            self.manual_override = false;
            self.move_input = Vec2::ZERO;
            self.set_down_manual_hold(world);
            self.events.push(AgentEvent::ManualModeChanged { enabled: false });
        }
        world.set_autonomy(true);
        self.battery.set_charging(false);

        let Some(destination) = self.charge.station().and_then(|id| world.zone_position(id)) else {
            warn!(agent_id = %self.id, "no charging station to head to");
            return;
        };
        if world.autonomy_enabled() && world.is_on_navigable_surface() {
            world.set_destination(destination);
            info!(agent_id = %self.id, x = destination.x, z = destination.z, "heading to charging station");
            self.events.push(AgentEvent::HeadingToStation { destination });
        } else {
            warn!(agent_id = %self.id, "cannot path to charging station from here");
        }
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    fn complete_subtask<W: MotionProxy + WorldQuery>(&mut self, task: PendingSubtask, world: &mut W) {
        let relevant = match task.kind {
            SubtaskKind::Lift => self.finish_lift(task.guard, world),
            SubtaskKind::Drop => self.finish_drop(task.guard, world),
            SubtaskKind::ManualPickup => self.finish_manual_pickup(task.guard, world),
            SubtaskKind::PickupCooldown => match task.guard {
                ResumeGuard::CooldownGeneration(generation) => self.grasp.end_cooldown(generation),
                ResumeGuard::RequireState(_) | ResumeGuard::ManualMode | ResumeGuard::Always => false,
            },
        };
        debug!(kind = ?task.kind, relevant, waited = self.now - task.scheduled_at, "subtask completed");
        self.events.push(AgentEvent::SubtaskCompleted {
            kind: task.kind,
            relevant,
        });
    }

    fn guard_holds(&self, guard: ResumeGuard) -> bool {
        match guard {
            ResumeGuard::RequireState(state) => self.machine.state() == state,
            ResumeGuard::ManualMode => self.manual_override,
            ResumeGuard::CooldownGeneration(_) | ResumeGuard::Always => true,
        }
    }

    fn finish_lift<W: MotionProxy + WorldQuery>(&mut self, guard: ResumeGuard, world: &mut W) -> bool {
        if !self.guard_holds(guard) {
            debug!(state = %self.machine.state(), "lift overridden, skipping grasp");
            return false;
        }
        let outcome = self.attempt_grasp(world);
        let missed = matches!(outcome, GraspOutcome::Miss(_));
        let drop_zone = world
            .find_zone(ZoneKind::DropZone)
            .and_then(|id| world.zone_position(id));

        match drop_zone {
            Some(_) if missed && self.config.skip_drop_on_grasp_miss => {
                self.machine.transition(TaskState::Idle, &mut self.events);
            }
            Some(destination) => {
                world.set_destination(destination);
                self.machine.transition(TaskState::MovingToDropZone, &mut self.events);
            }
            None => {
                warn!(agent_id = %self.id, "no drop zone, putting the box back");
                self.release_held(world, false);
                self.machine.transition(TaskState::Idle, &mut self.events);
            }
        }
        true
    }

    fn finish_manual_pickup<W: MotionProxy + WorldQuery>(&mut self, guard: ResumeGuard, world: &mut W) -> bool {
        if !self.guard_holds(guard) {
            debug!("manual mode ended before the pickup, skipping grasp");
            return false;
        }
        if matches!(self.attempt_grasp(world), GraspOutcome::Grasped(_)) {
            self.manual_hold = true;
        }
        true
    }

    fn finish_drop<W: MotionProxy + WorldQuery>(&mut self, guard: ResumeGuard, world: &mut W) -> bool {
        if let Some(object) = self.grasp.held() {
            let delivered = match self.config.delivery_policy {
                DeliveryPolicy::Unconditional => true,
                DeliveryPolicy::RequireDropZone => self.in_drop_zone,
            };
            if delivered {
                self.delivered.insert(object);
                info!(object_id = %object, total = self.delivered.len(), "delivered");
                self.events.push(AgentEvent::Delivered { object });
            }
            let scored = self.in_drop_zone;
            self.release_held(world, scored);
        }

        if !self.guard_holds(guard) {
            debug!(state = %self.machine.state(), "drop overridden, skipping transition");
            return false;
        }
        let low = self.battery.is_low();
        if low && self.machine.finish_task_before_charge() {
            self.head_to_station(world);
            self.machine.transition(TaskState::Charging, &mut self.events);
        } else if low {
            self.machine.transition(TaskState::Charging, &mut self.events);
        } else {
            self.machine.transition(TaskState::Idle, &mut self.events);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Grasp helpers
    // -----------------------------------------------------------------------

    fn hold_point<W: MotionProxy>(&self, world: &W) -> Vec3 {
        self.grasp.hold_point(world.position(), world.forward())
    }

    fn attempt_grasp<W: MotionProxy + WorldQuery>(&mut self, world: &mut W) -> GraspOutcome {
        let hold = self.hold_point(world);
        let outcome = self.grasp.try_grasp(hold, world, &self.delivered);
        match outcome {
            GraspOutcome::Grasped(object) => self.events.push(AgentEvent::Grasped { object }),
            GraspOutcome::Miss(reason) => {
                warn!(agent_id = %self.id, ?reason, "grasp missed");
                self.events.push(AgentEvent::GraspMiss);
            }
        }
        outcome
    }

    /// Put down a box picked up by hand; the machine never accounts for it.
    fn set_down_manual_hold<W: MotionProxy + WorldQuery>(&mut self, world: &mut W) {
        if self.manual_hold {
            self.release_held(world, false);
            self.manual_hold = false;
        }
    }

    /// Release whatever is held and start the pickup cooldown.
    fn release_held<W: MotionProxy + WorldQuery>(&mut self, world: &mut W, scored: bool) -> Option<ObjectId> {
        let hold = self.hold_point(world);
        let forward = world.forward();
        let release = self.grasp.release(hold, forward, world)?;
        self.manual_hold = false;
        self.scheduler.schedule(
            SubtaskKind::PickupCooldown,
            self.now,
            self.config.pickup_cooldown_secs,
            ResumeGuard::CooldownGeneration(release.cooldown_generation),
        );
        if scored {
            self.scorekeeper.notify_delivered();
        }
        self.events.push(AgentEvent::Released {
            object: release.object,
            scored,
        });
        Some(release.object)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Whether the held object is accounted for by the current state.
    ///
    /// Holding is legitimate while lifting, carrying, or dropping; after a
    /// manual grasp; or while a drop is still pending after the state was
    /// overridden.
    pub fn held_object_consistent(&self) -> bool {
        self.grasp.held().is_none()
            || self.machine.state().may_hold_object()
            || self.manual_hold
            || self.scheduler.has_pending(SubtaskKind::Drop)
    }

    /// Serializable view of the agent.
    pub fn snapshot<W: MotionProxy>(&self, world: &W) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: self.id,
            elapsed_secs: self.now,
            position: world.position(),
            task_state: self.machine.state(),
            battery_level: self.battery.level(),
            max_battery: self.battery.max(),
            battery_low: self.battery.is_low(),
            held_object: self.grasp.held(),
            delivered: self.delivered.clone(),
            manual_override: self.manual_override,
            is_charging: self.battery.is_charging(),
            in_drop_zone: self.in_drop_zone,
            pending_subtasks: self.scheduler.len(),
        }
    }

    /// Agent identity.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current task state.
    pub const fn state(&self) -> TaskState {
        self.machine.state()
    }

    /// Task machine, including the current target.
    pub const fn machine(&self) -> &TaskStateMachine {
        &self.machine
    }

    /// Battery model.
    pub const fn battery(&self) -> &BatteryModel {
        &self.battery
    }

    /// Mutable battery model, for scripted scenarios.
    pub const fn battery_mut(&mut self) -> &mut BatteryModel {
        &mut self.battery
    }

    /// Object currently held.
    pub const fn held(&self) -> Option<ObjectId> {
        self.grasp.held()
    }

    /// Objects delivered so far.
    pub const fn delivered(&self) -> &BTreeSet<ObjectId> {
        &self.delivered
    }

    /// Pending subtasks.
    pub const fn scheduler(&self) -> &SubtaskScheduler {
        &self.scheduler
    }

    /// Whether manual override is on.
    pub const fn is_manual(&self) -> bool {
        self.manual_override
    }

    /// Whether the agent is inside the drop zone.
    pub const fn in_drop_zone(&self) -> bool {
        self.in_drop_zone
    }

    /// Seconds of simulated time this controller has seen.
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Active tunables.
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Score sink.
    pub const fn scorekeeper(&self) -> &S {
        &self.scorekeeper
    }

    /// Mutable score sink.
    pub const fn scorekeeper_mut(&mut self) -> &mut S {
        &mut self.scorekeeper
    }
}
