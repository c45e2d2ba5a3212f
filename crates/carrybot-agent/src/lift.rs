//! Vertical lift platforms that carry a load between two heights.
//!
//! A [`LiftPlatform`] starts lowered. [`lift`](LiftPlatform::lift) picks up
//! the first `Load` sitting in its carry volume and raises it;
//! [`lower`](LiftPlatform::lower) brings it back down, and the load is set
//! free once the platform is fully down. Both requests are ignored while
//! the platform is moving or already at the requested height.

use core::cmp::Ordering;

use carrybot_types::geometry::{approximately, move_towards};
use carrybot_types::{ObjectId, Tag, Vec3};
use carrybot_world::{PlatformLayout, WorldQuery};
use tracing::{debug, info};

use crate::error::AgentError;

/// Half size of the volume above the platform top that is searched for a load.
const CARRY_HALF_EXTENTS: Vec3 = Vec3::new(0.675, 0.675, 0.675);

/// Clearance between the platform top and the bottom of the carry volume.
const CARRY_CLEARANCE: f64 = 0.02;

/// A platform moving between `down_y` and `up_y`.
#[derive(Debug, Clone)]
pub struct LiftPlatform {
    position: Vec3,
    down_y: f64,
    up_y: f64,
    speed: f64,
    current_y: f64,
    target_y: f64,
    busy: bool,
    load: Option<ObjectId>,
    load_offset: f64,
}

impl LiftPlatform {
    /// Build a lowered platform.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidPlatform`] unless `up_y > down_y` and
    /// `speed > 0`.
    pub fn new(position: Vec3, down_y: f64, up_y: f64, speed: f64) -> Result<Self, AgentError> {
        if up_y.partial_cmp(&down_y) != Some(Ordering::Greater) {
            return Err(AgentError::InvalidPlatform {
                reason: format!("up_y {up_y} must be above down_y {down_y}"),
            });
        }
        if speed.partial_cmp(&0.0) != Some(Ordering::Greater) {
            return Err(AgentError::InvalidPlatform {
                reason: format!("speed must be positive, got {speed}"),
            });
        }
        Ok(Self {
            position: position.with_y(0.0),
            down_y,
            up_y,
            speed,
            current_y: down_y,
            target_y: down_y,
            busy: false,
            load: None,
            load_offset: 0.0,
        })
    }

    /// Build from a layout entry.
    ///
    /// # Errors
    ///
    /// See [`LiftPlatform::new`].
    pub fn from_layout(layout: &PlatformLayout) -> Result<Self, AgentError> {
        Self::new(layout.position, layout.down_y, layout.up_y, layout.speed)
    }

    /// Start raising. Attaches the first load found on top.
    ///
    /// Returns `false` if the request was ignored.
    pub fn lift<W: WorldQuery + ?Sized>(&mut self, world: &mut W) -> bool {
        if self.busy || approximately(self.current_y, self.up_y) {
            return false;
        }
        self.target_y = self.up_y;
        self.busy = true;
        self.attach_load(world);
        info!(height = self.up_y, load = ?self.load, "platform lifting");
        true
    }

    /// Start lowering.
    ///
    /// Returns `false` if the request was ignored.
    pub fn lower(&mut self) -> bool {
        if self.busy || approximately(self.current_y, self.down_y) {
            return false;
        }
        self.target_y = self.down_y;
        self.busy = true;
        info!(height = self.down_y, "platform lowering");
        true
    }

    /// Move toward the target height, carrying the load.
    pub fn update<W: WorldQuery + ?Sized>(&mut self, dt: f64, world: &mut W) {
        if !self.busy {
            return;
        }
        self.current_y = move_towards(self.current_y, self.target_y, self.speed * dt);
        let carried = self
            .load
            .and_then(|load| world.object_position(load).map(|pos| (load, pos)));
        if let Some((load, pos)) = carried {
            world.set_object_position(load, pos.with_y(self.current_y + self.load_offset));
        }
        if approximately(self.current_y, self.target_y) {
            self.current_y = self.target_y;
            self.busy = false;
            debug!(height = self.current_y, "platform reached target");
            if approximately(self.current_y, self.down_y) {
                self.detach_load(world);
            }
        }
    }

    fn attach_load<W: WorldQuery + ?Sized>(&mut self, world: &mut W) {
        if self.load.is_some() {
            return;
        }
        let center = self.position.with_y(self.current_y + CARRY_CLEARANCE + CARRY_HALF_EXTENTS.y);
        let Some(&load) = world.overlap_query(center, CARRY_HALF_EXTENTS, Tag::Load).first() else {
            return;
        };
        let Some(pos) = world.object_position(load) else {
            return;
        };
        world.set_kinematic(load, true);
        self.load = Some(load);
        self.load_offset = pos.y - self.current_y;
    }

    fn detach_load<W: WorldQuery + ?Sized>(&mut self, world: &mut W) {
        if let Some(load) = self.load.take() {
            world.set_kinematic(load, false);
            debug!(object_id = %load, "platform released load");
        }
    }

    /// Current height of the platform top.
    pub const fn height(&self) -> f64 {
        self.current_y
    }

    /// Whether the platform is moving.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Load currently carried.
    pub const fn load(&self) -> Option<ObjectId> {
        self.load
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use carrybot_world::SandboxWorld;

    use super::*;

    fn setup() -> (LiftPlatform, SandboxWorld, ObjectId) {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        let load = world.add_body(Tag::Load, Vec3::new(2.0, 0.5, 2.0), 0.5);
        let platform = LiftPlatform::new(Vec3::new(2.0, 0.0, 2.0), 0.0, 0.35, 0.4).unwrap();
        (platform, world, load)
    }

    fn run(platform: &mut LiftPlatform, world: &mut SandboxWorld, secs: f64) {
        let steps = 20;
        for _ in 0..steps {
            platform.update(secs / f64::from(steps), world);
        }
    }

    #[test]
    fn lift_carries_load_up() {
        let (mut platform, mut world, load) = setup();
        assert!(platform.lift(&mut world));
        assert_eq!(platform.load(), Some(load));
        assert!(world.body(load).unwrap().kinematic);

        run(&mut platform, &mut world, 1.0);
        assert!(!platform.is_busy());
        assert!(approximately(platform.height(), 0.35));
        assert!(approximately(world.object_position(load).unwrap().y, 0.85));
    }

    #[test]
    fn requests_ignored_while_busy_or_at_target() {
        let (mut platform, mut world, _) = setup();
        assert!(!platform.lower());
        assert!(platform.lift(&mut world));
        assert!(!platform.lift(&mut world));
        assert!(!platform.lower());
        run(&mut platform, &mut world, 1.0);
        assert!(!platform.lift(&mut world));
        assert!(platform.lower());
    }

    #[test]
    fn load_detaches_when_fully_down() {
        let (mut platform, mut world, load) = setup();
        platform.lift(&mut world);
        run(&mut platform, &mut world, 1.0);
        platform.lower();
        platform.update(0.1, &mut world);
        assert_eq!(platform.load(), Some(load));
        run(&mut platform, &mut world, 1.0);
        assert!(platform.load().is_none());
        assert!(!world.body(load).unwrap().kinematic);
    }

    #[test]
    fn empty_platform_lifts_without_load() {
        let mut world = SandboxWorld::new(10.0, 3.5, 0.2);
        let mut platform = LiftPlatform::new(Vec3::ZERO, 0.0, 1.0, 1.0).unwrap();
        assert!(platform.lift(&mut world));
        assert!(platform.load().is_none());
    }

    #[test]
    fn rejects_inverted_heights() {
        assert!(matches!(
            LiftPlatform::new(Vec3::ZERO, 1.0, 0.5, 1.0),
            Err(AgentError::InvalidPlatform { .. })
        ));
        assert!(LiftPlatform::new(Vec3::ZERO, 0.0, 0.5, 0.0).is_err());
    }
}
