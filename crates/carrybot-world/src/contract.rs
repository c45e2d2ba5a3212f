//! Collaborator contracts the agent controller drives.
//!
//! The controller never touches a physics engine or path planner directly.
//! It speaks to three seams:
//!
//! - [`MotionProxy`] -- the agent's own body: destinations, stopping,
//!   arrival, manual driving.
//! - [`WorldQuery`] -- everything else in the scene: tagged candidates,
//!   ray and overlap probes, zone lookup, moving held objects.
//! - [`Scorekeeper`] -- the score sink notified on delivery and when the
//!   agent finishes charging.
//!
//! [`SandboxWorld`](crate::SandboxWorld) implements the first two;
//! [`Scoreboard`](crate::Scoreboard) implements the third.

use carrybot_types::{AgentId, ObjectId, Tag, Vec3, ZoneId, ZoneKind};

/// Bit set of physics layers a probe is allowed to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Layer holding fetchable boxes.
    pub const PICKUP: Self = Self(1);
    /// Layer holding platform loads.
    pub const LOAD: Self = Self(1 << 1);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// The layer an object with this tag lives on.
    pub const fn for_tag(tag: Tag) -> Self {
        match tag {
            Tag::Pickup => Self::PICKUP,
            Tag::Load => Self::LOAD,
        }
    }

    /// Whether the two masks share any layer.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// The agent's body as seen by the controller.
///
/// Implementations own the pose. Autonomous motion follows the current
/// destination; manual motion is applied through [`manual_drive`].
///
/// [`manual_drive`]: MotionProxy::manual_drive
pub trait MotionProxy {
    /// Start an autonomous path toward `point`, clearing any halt.
    fn set_destination(&mut self, point: Vec3);

    /// Halt autonomous motion and clear the current path.
    fn stop(&mut self);

    /// Whether the current path is finished.
    ///
    /// An agent with no active path has no remaining distance and counts
    /// as arrived.
    fn arrived(&self) -> bool;

    /// Whether the agent stands on the surface the path planner covers.
    fn is_on_navigable_surface(&self) -> bool;

    /// Autonomous speed over the last step in units per second.
    fn velocity_magnitude(&self) -> f64;

    /// Enable or disable autonomous path following.
    fn set_autonomy(&mut self, enabled: bool);

    /// Whether autonomous path following is enabled.
    fn autonomy_enabled(&self) -> bool;

    /// Current position.
    fn position(&self) -> Vec3;

    /// Current facing as a unit vector on the ground plane.
    fn forward(&self) -> Vec3;

    /// Drive `distance` along the facing, then turn by `yaw_degrees`.
    fn manual_drive(&mut self, distance: f64, yaw_degrees: f64);

    /// Move the agent onto the navigable surface if it is off it and the
    /// nearest navigable point is within `max_distance`.
    ///
    /// Returns the new position when a snap happened.
    fn snap_to_navigable(&mut self, max_distance: f64) -> Option<Vec3>;
}

/// Queries and mutations against the objects and zones of the scene.
pub trait WorldQuery {
    /// All objects carrying `tag`, in stable enumeration order.
    fn find_candidates(&self, tag: Tag) -> Vec<ObjectId>;

    /// Current position of an object.
    fn object_position(&self, id: ObjectId) -> Option<Vec3>;

    /// First object hit by a ray from `origin` along `direction`, limited
    /// to `max_distance` and the given layers.
    fn proximity_query(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f64,
        layers: LayerMask,
    ) -> Option<ObjectId>;

    /// Objects with `tag` whose position lies inside the box.
    fn overlap_query(&self, center: Vec3, half_extents: Vec3, tag: Tag) -> Vec<ObjectId>;

    /// Switch physics for an object. Returns `false` if the object is unknown.
    fn set_kinematic(&mut self, id: ObjectId, kinematic: bool) -> bool;

    /// Teleport an object. Returns `false` if the object is unknown.
    fn set_object_position(&mut self, id: ObjectId, position: Vec3) -> bool;

    /// First zone of the given kind.
    fn find_zone(&self, kind: ZoneKind) -> Option<ZoneId>;

    /// Center of a zone.
    fn zone_position(&self, id: ZoneId) -> Option<Vec3>;
}

/// Receives scoring and hand-off notifications from the controller.
pub trait Scorekeeper {
    /// A carried box was released inside the drop zone.
    fn notify_delivered(&mut self);

    /// The agent finished charging and is ready for work again.
    fn notify_agent_ready(&mut self, agent: AgentId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_layers_are_disjoint() {
        let pickup = LayerMask::for_tag(Tag::Pickup);
        let load = LayerMask::for_tag(Tag::Load);
        assert!(!pickup.intersects(load));
        assert!(LayerMask::ALL.intersects(pickup));
        assert!(!LayerMask::NONE.intersects(load));
    }
}
