//! Runtime controls shared between the run loop and whoever steers it.
//!
//! The engine's Ctrl-C handler, tests, or any future control surface hold
//! an `Arc<OperatorState>` and use it to pause the loop, stop it, change
//! the pacing, change the agent's move speed, or queue manual inputs.
//!
//! Flags checked every tick are atomics. Queued changes (move speed and
//! manual inputs) live together behind one tokio [`Mutex`] and are taken
//! once per tick, just before the step runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use carrybot_agent::clamp_move_speed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;
use crate::controller::InputCommand;

/// Smallest tick interval the operator may set at runtime.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// `bounds.max_ticks` steps have run.
    MaxTicksReached,
    /// `bounds.max_real_time_seconds` of wall time have passed.
    MaxRealTimeReached,
    /// [`OperatorState::request_stop`] was called.
    OperatorStop,
    /// The scoring round timer expired.
    RoundOver,
}

/// Changes waiting for the next tick.
#[derive(Debug, Default)]
struct Pending {
    move_speed: Option<f64>,
    inputs: Vec<InputCommand>,
}

/// Controls for one run, shared through an [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    /// Wakes a paused loop.
    wake: Notify,
    stop: AtomicBool,
    /// Milliseconds of real time between ticks.
    interval_ms: AtomicU64,
    started_at: DateTime<Utc>,
    bounds: SimulationBoundsConfig,
    pending: Mutex<Pending>,
    ended: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Controls for a fresh run.
    ///
    /// The initial interval is taken as given; 0 runs ticks back to back.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            wake: Notify::new(),
            stop: AtomicBool::new(false),
            interval_ms: AtomicU64::new(tick_interval_ms),
            started_at: Utc::now(),
            bounds: bounds.clone(),
            pending: Mutex::new(Pending::default()),
            ended: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is held.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Hold the loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Release a held loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    /// Park until [`resume`](Self::resume); returns at once when not paused.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() {
            self.wake.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to end before its next tick.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether [`request_stop`](Self::request_stop) was called.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Store why the run ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.ended.lock().await = Some(reason);
    }

    /// Why the run ended, once it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.ended.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Pacing and speed
    // -----------------------------------------------------------------------

    /// Real-time pause between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Acquire)
    }

    /// Change the pacing. Returns the old interval, or `None` when `ms`
    /// is below [`MIN_TICK_INTERVAL_MS`] and nothing changed.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        (ms >= MIN_TICK_INTERVAL_MS).then(|| self.interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Queue a move speed for the next tick and return it after clamping.
    ///
    /// A later request replaces one that has not been applied yet.
    pub async fn request_move_speed(&self, speed: f64) -> f64 {
        let clamped = clamp_move_speed(speed);
        self.pending.lock().await.move_speed = Some(clamped);
        clamped
    }

    /// Take the queued move speed.
    pub async fn take_move_speed(&self) -> Option<f64> {
        self.pending.lock().await.move_speed.take()
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `current_tick` has hit `max_ticks`; 0 means no limit.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.bounds.max_ticks > 0 && current_tick >= self.bounds.max_ticks
    }

    /// Whether the wall-clock budget is spent; 0 means no limit.
    pub fn time_limit_reached(&self) -> bool {
        self.bounds.max_real_time_seconds > 0
            && self.elapsed_seconds() >= self.bounds.max_real_time_seconds
    }

    /// When the controls were created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole wall-clock seconds since [`started_at`](Self::started_at).
    pub fn elapsed_seconds(&self) -> u64 {
        let secs = (Utc::now() - self.started_at).num_seconds();
        // Negative if the wall clock stepped backwards.
        u64::try_from(secs).unwrap_or(0)
    }

    /// Tick budget (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.bounds.max_ticks
    }

    /// Wall-clock budget in seconds (0 = unlimited).
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.bounds.max_real_time_seconds
    }

    // -----------------------------------------------------------------------
    // Manual input
    // -----------------------------------------------------------------------

    /// Queue a manual input for the next tick.
    pub async fn push_input(&self, input: InputCommand) {
        self.pending.lock().await.inputs.push(input);
    }

    /// Take every queued input in arrival order.
    pub async fn drain_inputs(&self) -> Vec<InputCommand> {
        std::mem::take(&mut self.pending.lock().await.inputs)
    }
}
