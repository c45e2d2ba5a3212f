//! Async run loop integrating [`Simulation::step`] with operator controls.
//!
//! Each iteration checks pause, stop, and the wall-clock limit, applies
//! queued operator changes (move speed, manual inputs), runs one step,
//! notifies the callback, then checks the round and tick limits before
//! sleeping for the tick interval.

use std::sync::Arc;
use std::time::Duration;

use carrybot_types::AgentSnapshot;
use tracing::info;

use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{Simulation, TickError, TickSummary};

/// Failure that aborts [`run_simulation`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// [`Simulation::step`] returned an error.
    #[error("step failed: {source}")]
    Tick {
        /// Error from the step.
        #[from]
        source: TickError,
    },
}

/// Outcome of a finished run.
#[derive(Debug)]
pub struct SimulationResult {
    /// What ended the run.
    pub end_reason: SimulationEndReason,
    /// Summary of the last step, `None` when the run ended before any.
    pub final_summary: Option<TickSummary>,
    /// Steps executed.
    pub total_ticks: u64,
    /// Agent state when the run ended.
    pub final_snapshot: AgentSnapshot,
    /// Score of the last round.
    pub score: u32,
    /// Best round score.
    pub high_score: u32,
}

/// Observer of each completed step.
pub trait TickCallback: Send {
    /// Sees the summary of the step that just ran and the simulation after it.
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation);
}

/// Callback that ignores every step.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {}
}

/// Step `sim` until the operator stops it, a limit is hit, or the round
/// ends (when configured to end the run).
///
/// # Errors
///
/// Returns [`RunnerError`] if a step fails.
pub async fn run_simulation(
    sim: &mut Simulation,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut previous: Option<TickSummary> = None;
    let mut steps: u64 = 0;

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        dt = sim.clock().dt(),
        "run starting"
    );

    loop {
        if operator.is_paused() {
            info!(tick = sim.clock().tick(), "run paused");
            operator.wait_if_paused().await;
            info!(tick = sim.clock().tick(), "run resumed");
        }

        if let Some(reason) = check_before_step(operator) {
            return Ok(finish(sim, operator, reason, previous, steps).await);
        }

        if let Some(speed) = operator.take_move_speed().await {
            sim.set_move_speed(speed);
        }
        for input in operator.drain_inputs().await {
            sim.apply_input(input);
        }

        let summary = sim.step()?;
        steps = steps.saturating_add(1);
        callback.on_tick(&summary, sim);

        if summary.round_over && sim.ends_on_round_over() {
            info!(tick = summary.tick, score = summary.score, "round over, ending run");
            return Ok(finish(sim, operator, SimulationEndReason::RoundOver, Some(summary), steps).await);
        }

        // summary.tick counts the step that just ran: max_ticks = 5 stops after five.
        if operator.tick_limit_reached(summary.tick) {
            info!(tick = summary.tick, max_ticks = operator.max_ticks(), "tick budget spent");
            return Ok(finish(sim, operator, SimulationEndReason::MaxTicksReached, Some(summary), steps).await);
        }

        previous = Some(summary);

        let pace = operator.tick_interval_ms();
        if pace > 0 {
            tokio::time::sleep(Duration::from_millis(pace)).await;
        }
    }
}

/// Stop request wins over the wall-clock budget.
fn check_before_step(operator: &OperatorState) -> Option<SimulationEndReason> {
    if operator.is_stop_requested() {
        info!("stop requested");
        return Some(SimulationEndReason::OperatorStop);
    }
    if operator.time_limit_reached() {
        info!(
            budget_secs = operator.max_real_time_seconds(),
            elapsed_secs = operator.elapsed_seconds(),
            "wall-clock budget spent"
        );
        return Some(SimulationEndReason::MaxRealTimeReached);
    }
    None
}

async fn finish(
    sim: &Simulation,
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(reason.clone()).await;
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
        final_snapshot: sim.snapshot(),
        score: sim.scoreboard().score(),
        high_score: sim.scoreboard().high_score(),
    }
}

/// Write the end-of-run summary to the log.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        score = result.score,
        high_score = result.high_score,
        "Simulation ended"
    );

    let snapshot = &result.final_snapshot;
    info!(
        state = %snapshot.task_state,
        battery = snapshot.battery_level,
        battery_fraction = snapshot.battery_fraction(),
        delivered = snapshot.delivered.len(),
        holding = snapshot.held_object.is_some(),
        elapsed_secs = snapshot.elapsed_secs,
        "Final agent state"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use carrybot_types::{TaskState, Vec2};

    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};
    use crate::controller::InputCommand;

    fn sim() -> Simulation {
        Simulation::from_config(&SimulationConfig::default()).unwrap()
    }

    fn operator(max_ticks: u64) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(
            0,
            &SimulationBoundsConfig {
                max_ticks,
                max_real_time_seconds: 0,
            },
        ))
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut sim = sim();
        let op = operator(5);
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_summary.unwrap().tick, 5);
        assert_eq!(op.end_reason().await, Some(SimulationEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn operator_stop_before_first_tick() {
        let mut sim = sim();
        let op = operator(0);
        op.request_stop();
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(result.final_snapshot.task_state, TaskState::Idle);
    }

    struct CountingCallback {
        count: u64,
    }

    impl TickCallback for CountingCallback {
        fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {
            self.count = self.count.saturating_add(1);
        }
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        let mut sim = sim();
        let op = operator(3);
        let mut callback = CountingCallback { count: 0 };
        run_simulation(&mut sim, &op, &mut callback).await.unwrap();
        assert_eq!(callback.count, 3);
    }

    #[tokio::test]
    async fn round_over_ends_the_run() {
        let mut config = SimulationConfig::default();
        config.scoring.round_secs = 0.5;
        let mut sim = Simulation::from_config(&config).unwrap();
        let op = operator(1_000);
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::RoundOver);
        assert_eq!(result.total_ticks, 10);
        assert!(!sim.scoreboard().is_active());
    }

    #[tokio::test]
    async fn round_over_can_be_ignored() {
        let mut config = SimulationConfig::default();
        config.scoring.round_secs = 0.5;
        config.scoring.end_on_round_over = false;
        let mut sim = Simulation::from_config(&config).unwrap();
        let op = operator(20);
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
    }

    #[tokio::test]
    async fn queued_inputs_and_speed_apply_before_the_tick() {
        let mut sim = sim();
        let op = operator(1);
        op.push_input(InputCommand::ToggleManual).await;
        op.push_input(InputCommand::Move(Vec2::new(0.0, 1.0))).await;
        op.request_move_speed(2.0).await;
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert!(result.final_snapshot.manual_override);
        assert!((sim.controller().config().move_speed - 2.0).abs() < f64::EPSILON);
        assert!((result.final_snapshot.position.z - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn variable_speed() {
        let mut sim = sim();
        let op = operator(4);
        assert_eq!(op.set_tick_interval_ms(10), Some(0));
        let result = run_simulation(&mut sim, &op, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.total_ticks, 4);
    }
}
