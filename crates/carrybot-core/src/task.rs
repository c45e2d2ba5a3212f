//! Task state machine and target selection.
//!
//! [`TaskStateMachine`] holds the current [`TaskState`] and the chosen
//! target. It does not decide when to move between states; the controller
//! does that. It records every transition and emits the matching
//! [`AgentEvent::StateChanged`].

use std::collections::BTreeSet;

use carrybot_types::{AgentEvent, ObjectId, Tag, TaskState, Vec3};
use carrybot_world::WorldQuery;
use tracing::{debug, info};

/// A pickup chosen by [`TaskStateMachine::select_target`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// The chosen object.
    pub object: ObjectId,
    /// Its position at selection time.
    pub position: Vec3,
}

/// Current task state plus the selected target.
#[derive(Debug, Clone, Default)]
pub struct TaskStateMachine {
    state: TaskState,
    target: Option<Target>,
    /// Consulted by the drop completion but never set; always `false`.
    finish_task_before_charge: bool,
}

impl TaskStateMachine {
    /// Start in [`TaskState::Idle`] with no target.
    pub const fn new() -> Self {
        Self {
            state: TaskState::Idle,
            target: None,
            finish_task_before_charge: false,
        }
    }

    /// Current state.
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Current target, if one was selected.
    pub const fn target(&self) -> Option<Target> {
        self.target
    }

    /// Whether the low-battery drop path should finish the task first.
    pub const fn finish_task_before_charge(&self) -> bool {
        self.finish_task_before_charge
    }

    /// Move to `to`. A transition to the current state is recorded too.
    pub fn transition(&mut self, to: TaskState, events: &mut Vec<AgentEvent>) {
        let from = self.state;
        self.state = to;
        if from == to {
            debug!(state = %to, "state re-entered");
        } else {
            info!(from = %from, to = %to, "task state changed");
        }
        events.push(AgentEvent::StateChanged { from, to });
    }

    /// Choose the nearest pickup to `from` that is not delivered.
    ///
    /// Candidates are scanned in the world's enumeration order and a later
    /// candidate replaces the best only when strictly closer, so ties go to
    /// the first one enumerated. The previous target is replaced either way.
    pub fn select_target<W: WorldQuery + ?Sized>(
        &mut self,
        from: Vec3,
        world: &W,
        delivered: &BTreeSet<ObjectId>,
    ) -> Option<Target> {
        let mut best: Option<(Target, f64)> = None;
        for object in world.find_candidates(Tag::Pickup) {
            if delivered.contains(&object) {
                continue;
            }
            let Some(position) = world.object_position(object) else {
                continue;
            };
            let distance = from.distance(position);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((Target { object, position }, distance));
            }
        }
        self.target = best.map(|(target, _)| target);
        self.target
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use carrybot_world::SandboxWorld;

    use super::*;

    #[test]
    fn starts_idle_and_records_transitions() {
        let mut machine = TaskStateMachine::new();
        let mut events = Vec::new();
        assert_eq!(machine.state(), TaskState::Idle);
        machine.transition(TaskState::SeekingTarget, &mut events);
        assert_eq!(machine.state(), TaskState::SeekingTarget);
        assert_eq!(
            events,
            vec![AgentEvent::StateChanged {
                from: TaskState::Idle,
                to: TaskState::SeekingTarget
            }]
        );
        assert!(!machine.finish_task_before_charge());
    }

    #[test]
    fn picks_nearest_undelivered() {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        let far = world.add_body(Tag::Pickup, Vec3::new(5.0, 0.5, 0.0), 0.5);
        let near = world.add_body(Tag::Pickup, Vec3::new(1.0, 0.5, 0.0), 0.5);
        let mut machine = TaskStateMachine::new();

        let target = machine.select_target(Vec3::ZERO, &world, &BTreeSet::new()).unwrap();
        assert_eq!(target.object, near);

        let delivered = BTreeSet::from([near]);
        let target = machine.select_target(Vec3::ZERO, &world, &delivered).unwrap();
        assert_eq!(target.object, far);

        let delivered = BTreeSet::from([near, far]);
        assert!(machine.select_target(Vec3::ZERO, &world, &delivered).is_none());
        assert!(machine.target().is_none());
    }

    #[test]
    fn ties_go_to_first_enumerated() {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        let first = world.add_body(Tag::Pickup, Vec3::new(2.0, 0.5, 0.0), 0.5);
        let _second = world.add_body(Tag::Pickup, Vec3::new(-2.0, 0.5, 0.0), 0.5);
        let mut machine = TaskStateMachine::new();
        let target = machine.select_target(Vec3::ZERO, &world, &BTreeSet::new()).unwrap();
        assert_eq!(target.object, first);
    }

    #[test]
    fn loads_are_not_candidates() {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        world.add_body(Tag::Load, Vec3::new(1.0, 0.5, 0.0), 0.5);
        let mut machine = TaskStateMachine::new();
        assert!(machine.select_target(Vec3::ZERO, &world, &BTreeSet::new()).is_none());
    }
}
