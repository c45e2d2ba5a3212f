//! One simulation step: world, agent, scoreboard, platforms.
//!
//! Each call to [`Simulation::step`] runs these phases in order:
//!
//! 1. **Clock** -- advance the tick counter and simulated time.
//! 2. **World** -- move the agent along its path, settle free bodies, and
//!    collect zone crossings.
//! 3. **Zones** -- hand each crossing to the controller.
//! 4. **Agent** -- run one controller tick.
//! 5. **Round** -- count down the scoreboard timer.
//! 6. **Platforms** -- move lift platforms and their loads.
//!
//! Given the same config and inputs the step sequence is deterministic.

use carrybot_agent::{AgentError, LiftPlatform};
use carrybot_types::{AgentEvent, AgentSnapshot, ObjectId, TaskState};
use carrybot_world::{SandboxWorld, Scoreboard, StartingLayoutIds, WorldError, create_starting_world};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{ClockError, SimClock};
use crate::config::SimulationConfig;
use crate::controller::{AgentController, InputCommand};

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Agent setup failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// No platform exists at this index.
    #[error("no lift platform at index {index}")]
    PlatformNotFound {
        /// The requested index.
        index: usize,
    },
}

/// Summary of a completed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds at the end of the tick.
    pub elapsed_secs: f64,
    /// Everything the agent reported during the tick.
    pub events: Vec<AgentEvent>,
    /// Task state at the end of the tick.
    pub task_state: TaskState,
    /// Battery level at the end of the tick.
    pub battery_level: f64,
    /// Object held at the end of the tick.
    pub held_object: Option<ObjectId>,
    /// Number of delivered objects.
    pub delivered: usize,
    /// Round score.
    pub score: u32,
    /// Whether the scoring round ended during this tick.
    pub round_over: bool,
}

/// The complete simulated system for one agent.
#[derive(Debug)]
pub struct Simulation {
    clock: SimClock,
    world: SandboxWorld,
    controller: AgentController<Scoreboard>,
    platforms: Vec<LiftPlatform>,
    layout: StartingLayoutIds,
    end_on_round_over: bool,
}

impl Simulation {
    /// Assemble a simulation from parts and start the agent and round.
    pub fn new(
        clock: SimClock,
        mut world: SandboxWorld,
        mut controller: AgentController<Scoreboard>,
        platforms: Vec<LiftPlatform>,
        layout: StartingLayoutIds,
    ) -> Self {
        controller.start(&mut world);
        controller.scorekeeper_mut().start_round();
        Self {
            clock,
            world,
            controller,
            platforms,
            layout,
            end_on_round_over: true,
        }
    }

    /// Build the seeded starting world and an idle agent from config.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the tick length, layout, agent tunables,
    /// or a platform are invalid.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TickError> {
        let clock = SimClock::new(config.world.tick_secs)?;
        let (world, layout) = create_starting_world(
            &config.layout,
            config.world.seed,
            config.agent.move_speed,
            config.agent.arrive_threshold,
        )?;
        let scoreboard = Scoreboard::new(config.scoring.round_secs);
        let controller = AgentController::new(config.agent.clone(), scoreboard, layout.charging_station)?;
        let platforms = config
            .layout
            .platforms
            .iter()
            .map(LiftPlatform::from_layout)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            name = %config.world.name,
            seed = config.world.seed,
            tick_secs = config.world.tick_secs,
            pickups = layout.pickups.len(),
            platforms = platforms.len(),
            "simulation built"
        );

        let mut sim = Self::new(clock, world, controller, platforms, layout);
        sim.end_on_round_over = config.scoring.end_on_round_over;
        Ok(sim)
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the tick counter would overflow.
    pub fn step(&mut self) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance()?;
        let dt = self.clock.dt();

        for event in self.world.step(dt) {
            self.controller.on_zone_event(event, &mut self.world);
        }

        let events = self.controller.tick(dt, &mut self.world);
        let round_over = self.controller.scorekeeper_mut().tick(dt);

        for platform in &mut self.platforms {
            platform.update(dt, &mut self.world);
        }

        let summary = TickSummary {
            tick,
            elapsed_secs: self.clock.elapsed_secs(),
            events,
            task_state: self.controller.state(),
            battery_level: self.controller.battery().level(),
            held_object: self.controller.held(),
            delivered: self.controller.delivered().len(),
            score: self.controller.scorekeeper().score(),
            round_over,
        };
        debug!(
            tick,
            state = %summary.task_state,
            battery = summary.battery_level,
            events = summary.events.len(),
            "tick complete"
        );
        Ok(summary)
    }

    /// Run `count` steps and return every summary.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step.
    pub fn run_steps(&mut self, count: u64) -> Result<Vec<TickSummary>, TickError> {
        (0..count).map(|_| self.step()).collect()
    }

    /// Apply a manual control input before the next step.
    pub fn apply_input(&mut self, input: InputCommand) {
        debug!(?input, "input applied");
        self.controller.handle_input(input, &mut self.world);
    }

    /// Change the agent's move speed (clamped). Returns the applied value.
    pub fn set_move_speed(&mut self, speed: f64) -> f64 {
        let applied = self.controller.set_move_speed(speed);
        self.world.set_move_speed(applied);
        applied
    }

    /// Raise the platform at `index`. Returns `false` if it ignored the request.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::PlatformNotFound`] for an unknown index.
    pub fn lift_platform(&mut self, index: usize) -> Result<bool, TickError> {
        let platform = self
            .platforms
            .get_mut(index)
            .ok_or(TickError::PlatformNotFound { index })?;
        Ok(platform.lift(&mut self.world))
    }

    /// Lower the platform at `index`. Returns `false` if it ignored the request.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::PlatformNotFound`] for an unknown index.
    pub fn lower_platform(&mut self, index: usize) -> Result<bool, TickError> {
        let platform = self
            .platforms
            .get_mut(index)
            .ok_or(TickError::PlatformNotFound { index })?;
        Ok(platform.lower())
    }

    /// Start a fresh scoring round; the high score is kept.
    pub fn restart_round(&mut self) {
        self.controller.scorekeeper_mut().start_round();
    }

    /// Whether the run should end when the round timer expires.
    pub const fn ends_on_round_over(&self) -> bool {
        self.end_on_round_over
    }

    /// Set whether the run ends when the round timer expires.
    pub const fn set_end_on_round_over(&mut self, end: bool) {
        self.end_on_round_over = end;
    }

    /// Serializable view of the agent.
    pub fn snapshot(&self) -> AgentSnapshot {
        self.controller.snapshot(&self.world)
    }

    /// Simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The world.
    pub const fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// Mutable world, for scripted scenarios.
    pub const fn world_mut(&mut self) -> &mut SandboxWorld {
        &mut self.world
    }

    /// The agent controller.
    pub const fn controller(&self) -> &AgentController<Scoreboard> {
        &self.controller
    }

    /// Mutable agent controller, for scripted scenarios.
    pub const fn controller_mut(&mut self) -> &mut AgentController<Scoreboard> {
        &mut self.controller
    }

    /// The scoreboard.
    pub const fn scoreboard(&self) -> &Scoreboard {
        self.controller.scorekeeper()
    }

    /// Lift platforms in layout order.
    pub fn platforms(&self) -> &[LiftPlatform] {
        &self.platforms
    }

    /// Ids created by the starting layout.
    pub const fn layout(&self) -> &StartingLayoutIds {
        &self.layout
    }
}
