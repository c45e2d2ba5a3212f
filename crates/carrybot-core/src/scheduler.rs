//! Deferred subtasks keyed to simulated time.
//!
//! A subtask is a sub-action that must finish after a delay: the lift
//! before a grasp, the drop before a release, the manual pickup, and the
//! end of the pickup cooldown. Each one carries a [`ResumeGuard`] that the
//! controller checks when it comes due; a subtask whose guard no longer
//! holds still completes, but its state transition is skipped.
//!
//! Subtasks are not cancelled on state changes. They are only ever
//! drained by [`SubtaskScheduler::take_due`].

use carrybot_types::SubtaskKind;
use carrybot_types::TaskState;
use carrybot_types::geometry::EPSILON;
use serde::{Deserialize, Serialize};

/// Condition re-checked when a subtask resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumeGuard {
    /// The transition applies only if the machine is still in this state.
    RequireState(TaskState),
    /// The cooldown release this subtask ends.
    CooldownGeneration(u64),
    /// Manual override must still be on.
    ManualMode,
    /// No condition.
    Always,
}

/// A subtask waiting for its due time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingSubtask {
    /// Scheduling order; breaks ties between equal due times.
    pub id: u64,
    /// What to do when due.
    pub kind: SubtaskKind,
    /// Simulated time at scheduling.
    pub scheduled_at: f64,
    /// Simulated time at which the subtask completes.
    pub due_at: f64,
    /// Condition checked on completion.
    pub guard: ResumeGuard,
}

/// Ordered set of pending subtasks.
#[derive(Debug, Clone, Default)]
pub struct SubtaskScheduler {
    pending: Vec<PendingSubtask>,
    next_id: u64,
}

impl SubtaskScheduler {
    /// Create an empty scheduler.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `kind` to complete `delay_secs` after `now`.
    ///
    /// Negative or NaN delays complete on the next drain.
    pub fn schedule(
        &mut self,
        kind: SubtaskKind,
        now: f64,
        delay_secs: f64,
        guard: ResumeGuard,
    ) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let delay = if delay_secs.is_nan() { 0.0 } else { delay_secs.max(0.0) };
        self.pending.push(PendingSubtask {
            id,
            kind,
            scheduled_at: now,
            due_at: now + delay,
            guard,
        });
        id
    }

    /// Remove and return every subtask due at `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<PendingSubtask> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|task| task.due_at <= now + EPSILON);
        self.pending = rest;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.id.cmp(&b.id)));
        due
    }

    /// Number of pending subtasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a subtask of `kind` is pending.
    pub fn has_pending(&self, kind: SubtaskKind) -> bool {
        self.pending.iter().any(|task| task.kind == kind)
    }

    /// Pending subtasks in scheduling order.
    pub fn pending(&self) -> &[PendingSubtask] {
        &self.pending
    }
}
