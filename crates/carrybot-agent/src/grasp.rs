//! Grasping and releasing objects at the hold point.
//!
//! The [`GraspController`] owns the held-object slot and the pickup
//! cooldown. It talks to the world only through [`WorldQuery`]; pose data
//! (hold point, facing) is passed in by the caller so the same world value
//! can serve as both motion proxy and query surface.
//!
//! A release starts a cooldown and hands back a generation number. The
//! scheduler later calls [`GraspController::end_cooldown`] with that
//! number; a stale generation is ignored, so an older cooldown can never
//! shorten a newer one.

use std::collections::BTreeSet;

use carrybot_types::{ObjectId, Vec3};
use carrybot_world::{LayerMask, WorldQuery};
use tracing::{debug, info};

use crate::config::AgentConfig;

/// Why a grasp attempt came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspMiss {
    /// The post-release cooldown has not elapsed.
    CoolingDown,
    /// Something is already held.
    AlreadyHolding,
    /// The probe hit nothing on the pickup layer.
    NothingInRange,
    /// The probe hit an object that was already delivered.
    AlreadyDelivered,
}

/// Result of [`GraspController::try_grasp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspOutcome {
    /// The object is now held.
    Grasped(ObjectId),
    /// Nothing was grasped.
    Miss(GraspMiss),
}

/// A completed release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    /// The object that was let go.
    pub object: ObjectId,
    /// Cooldown generation to pass back to [`GraspController::end_cooldown`].
    pub cooldown_generation: u64,
}

/// Held-object slot, cooldown, and hold-point geometry.
#[derive(Debug, Clone)]
pub struct GraspController {
    held: Option<ObjectId>,
    can_pickup: bool,
    cooldown_generation: u64,
    hold_height: f64,
    hold_forward: f64,
    probe_drop: f64,
    pickup_range: f64,
    release_offset: f64,
}

impl GraspController {
    /// Build from tunables with an empty hold and no cooldown.
    pub const fn from_config(config: &AgentConfig) -> Self {
        Self {
            held: None,
            can_pickup: true,
            cooldown_generation: 0,
            hold_height: config.hold_height,
            hold_forward: config.hold_forward,
            probe_drop: config.probe_drop,
            pickup_range: config.pickup_range,
            release_offset: config.release_offset,
        }
    }

    /// World position of the hold point for an agent pose.
    pub fn hold_point(&self, position: Vec3, forward: Vec3) -> Vec3 {
        position + Vec3::UP * self.hold_height + forward * self.hold_forward
    }

    /// Probe upward from just below the hold point and attach the first
    /// pickup found.
    pub fn try_grasp<W: WorldQuery + ?Sized>(
        &mut self,
        hold_point: Vec3,
        world: &mut W,
        delivered: &BTreeSet<ObjectId>,
    ) -> GraspOutcome {
        if !self.can_pickup {
            debug!("grasp blocked by cooldown");
            return GraspOutcome::Miss(GraspMiss::CoolingDown);
        }
        if self.held.is_some() {
            return GraspOutcome::Miss(GraspMiss::AlreadyHolding);
        }

        let origin = hold_point - Vec3::UP * self.probe_drop;
        let Some(object) = world.proximity_query(origin, Vec3::UP, self.pickup_range, LayerMask::PICKUP)
        else {
            info!("no object detected");
            return GraspOutcome::Miss(GraspMiss::NothingInRange);
        };
        if delivered.contains(&object) {
            debug!(object_id = %object, "probe hit a delivered object");
            return GraspOutcome::Miss(GraspMiss::AlreadyDelivered);
        }

        world.set_kinematic(object, true);
        world.set_object_position(object, hold_point);
        self.held = Some(object);
        info!(object_id = %object, "picked up");
        GraspOutcome::Grasped(object)
    }

    /// Let go of the held object, push it forward, and start the cooldown.
    ///
    /// Returns `None` (and starts no cooldown) if nothing is held.
    pub fn release<W: WorldQuery + ?Sized>(
        &mut self,
        hold_point: Vec3,
        forward: Vec3,
        world: &mut W,
    ) -> Option<Release> {
        let object = self.held.take()?;
        world.set_kinematic(object, false);
        world.set_object_position(object, hold_point + forward * self.release_offset);
        self.can_pickup = false;
        self.cooldown_generation = self.cooldown_generation.saturating_add(1);
        info!(object_id = %object, "dropped object");
        Some(Release {
            object,
            cooldown_generation: self.cooldown_generation,
        })
    }

    /// End the cooldown started by the release with `generation`.
    ///
    /// Returns `false` if a newer release has restarted the cooldown.
    pub const fn end_cooldown(&mut self, generation: u64) -> bool {
        if generation != self.cooldown_generation {
            return false;
        }
        self.can_pickup = true;
        true
    }

    /// Move the held object to the hold point.
    pub fn follow<W: WorldQuery + ?Sized>(&self, hold_point: Vec3, world: &mut W) {
        if let Some(object) = self.held {
            world.set_object_position(object, hold_point);
        }
    }

    /// Object currently held.
    pub const fn held(&self) -> Option<ObjectId> {
        self.held
    }

    /// Whether the cooldown has elapsed.
    pub const fn can_pickup(&self) -> bool {
        self.can_pickup
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use carrybot_types::Tag;
    use carrybot_types::geometry::approximately;
    use carrybot_world::SandboxWorld;

    use super::*;

    fn setup() -> (GraspController, SandboxWorld, ObjectId) {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        let id = world.add_body(Tag::Pickup, Vec3::new(0.0, 0.5, 0.25), 0.5);
        (GraspController::from_config(&AgentConfig::default()), world, id)
    }

    fn pose(grasp: &GraspController) -> (Vec3, Vec3) {
        let forward = Vec3::forward_from_yaw(0.0);
        (grasp.hold_point(Vec3::ZERO, forward), forward)
    }

    #[test]
    fn grasp_attaches_and_follows() {
        let (mut grasp, mut world, id) = setup();
        let (hold, _) = pose(&grasp);
        let outcome = grasp.try_grasp(hold, &mut world, &BTreeSet::new());
        assert_eq!(outcome, GraspOutcome::Grasped(id));
        assert_eq!(grasp.held(), Some(id));
        assert!(world.body(id).unwrap().kinematic);

        let moved = Vec3::new(3.0, 0.5, 3.0);
        grasp.follow(moved, &mut world);
        assert_eq!(world.object_position(id), Some(moved));
    }

    #[test]
    fn delivered_objects_are_never_grasped() {
        let (mut grasp, mut world, id) = setup();
        let (hold, _) = pose(&grasp);
        let delivered = BTreeSet::from([id]);
        let outcome = grasp.try_grasp(hold, &mut world, &delivered);
        assert_eq!(outcome, GraspOutcome::Miss(GraspMiss::AlreadyDelivered));
        assert!(grasp.held().is_none());
    }

    #[test]
    fn empty_probe_misses() {
        let (mut grasp, mut world, _) = setup();
        let far = grasp.hold_point(Vec3::new(5.0, 0.0, 5.0), Vec3::forward_from_yaw(0.0));
        let outcome = grasp.try_grasp(far, &mut world, &BTreeSet::new());
        assert_eq!(outcome, GraspOutcome::Miss(GraspMiss::NothingInRange));
    }

    #[test]
    fn release_pushes_forward_and_starts_cooldown() {
        let (mut grasp, mut world, id) = setup();
        let (hold, forward) = pose(&grasp);
        grasp.try_grasp(hold, &mut world, &BTreeSet::new());

        let release = grasp.release(hold, forward, &mut world).unwrap();
        assert_eq!(release.object, id);
        assert!(grasp.held().is_none());
        assert!(!grasp.can_pickup());
        assert!(!world.body(id).unwrap().kinematic);
        let pos = world.object_position(id).unwrap();
        assert!(approximately(pos.z, hold.z + 0.5));

        let outcome = grasp.try_grasp(hold, &mut world, &BTreeSet::new());
        assert_eq!(outcome, GraspOutcome::Miss(GraspMiss::CoolingDown));
    }

    #[test]
    fn release_with_empty_hands_is_noop() {
        let (mut grasp, mut world, _) = setup();
        let (hold, forward) = pose(&grasp);
        assert!(grasp.release(hold, forward, &mut world).is_none());
        assert!(grasp.can_pickup());
    }

    #[test]
    fn stale_cooldown_does_not_end_newer_one() {
        let (mut grasp, mut world, id) = setup();
        let (hold, forward) = pose(&grasp);

        grasp.try_grasp(hold, &mut world, &BTreeSet::new());
        let first = grasp.release(hold, forward, &mut world).unwrap();
        assert!(grasp.end_cooldown(first.cooldown_generation));
        world.set_object_position(id, hold);

        let outcome = grasp.try_grasp(hold, &mut world, &BTreeSet::new());
        assert!(matches!(outcome, GraspOutcome::Grasped(_)));
        let second = grasp.release(hold, forward, &mut world).unwrap();

        assert!(!grasp.end_cooldown(first.cooldown_generation));
        assert!(!grasp.can_pickup());
        assert!(grasp.end_cooldown(second.cooldown_generation));
        assert!(grasp.can_pickup());
    }
}
