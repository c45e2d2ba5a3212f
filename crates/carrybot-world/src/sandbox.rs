//! Kinematic reference world implementing [`MotionProxy`] and [`WorldQuery`].
//!
//! The [`SandboxWorld`] is a flat square arena standing in for a physics
//! engine and path planner. Bodies are spheres; the navigable surface is
//! the arena square; autonomous motion is a straight line toward the
//! destination at a fixed speed. It is deterministic, which makes it the
//! world every scenario test runs against.
//!
//! Each call to [`SandboxWorld::step`] advances motion, settles free
//! bodies onto their rest height, and reports trigger-volume crossings.

use carrybot_types::{ObjectId, Tag, Vec3, ZoneEvent, ZoneId, ZoneKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract::{LayerMask, MotionProxy, WorldQuery};
use crate::error::WorldError;
use crate::zone::{Zone, ZoneSet};

/// A spherical object resting in (or carried through) the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Object identity.
    pub id: ObjectId,
    /// Tag used by candidate and overlap queries.
    pub tag: Tag,
    /// Physics layer used by ray probes.
    pub layer: u32,
    /// Center position.
    pub position: Vec3,
    /// Sphere radius.
    pub radius: f64,
    /// Height the body settles to when physics is on.
    pub rest_height: f64,
    /// Whether physics is suspended (held or carried).
    pub kinematic: bool,
}

#[derive(Debug, Clone)]
struct AgentBody {
    position: Vec3,
    yaw_degrees: f64,
    destination: Option<Vec3>,
    autonomy: bool,
    velocity: f64,
    move_speed: f64,
    arrive_threshold: f64,
}

/// Deterministic kinematic world for one agent.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    /// Bodies in insertion order; this is the enumeration order.
    bodies: Vec<Body>,
    zones: ZoneSet,
    agent: AgentBody,
    arena_half_extent: f64,
}

impl SandboxWorld {
    /// Create an empty arena spanning `[-half, half]` on X and Z.
    pub fn new(arena_half_extent: f64, move_speed: f64, arrive_threshold: f64) -> Self {
        Self {
            bodies: Vec::new(),
            zones: ZoneSet::new(),
            agent: AgentBody {
                position: Vec3::ZERO,
                yaw_degrees: 0.0,
                destination: None,
                autonomy: true,
                velocity: 0.0,
                move_speed,
                arrive_threshold,
            },
            arena_half_extent,
        }
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Add a body resting at `position` and return its id.
    pub fn add_body(&mut self, tag: Tag, position: Vec3, radius: f64) -> ObjectId {
        let id = ObjectId::new();
        self.bodies.push(Body {
            id,
            tag,
            layer: LayerMask::for_tag(tag).0,
            position,
            radius,
            rest_height: position.y,
            kinematic: false,
        });
        id
    }

    /// Add a trigger volume and return its id.
    ///
    /// Occupancy is evaluated on the next [`step`](Self::step).
    pub fn add_zone(&mut self, kind: ZoneKind, center: Vec3, half_extents: Vec3) -> ZoneId {
        self.zones.add(kind, center, half_extents)
    }

    /// Teleport the agent, keeping its facing.
    pub const fn place_agent(&mut self, position: Vec3) {
        self.agent.position = position;
    }

    /// Set the agent's facing in degrees.
    pub const fn set_agent_yaw(&mut self, yaw_degrees: f64) {
        self.agent.yaw_degrees = yaw_degrees;
    }

    /// Change the autonomous driving speed.
    pub const fn set_move_speed(&mut self, move_speed: f64) {
        self.agent.move_speed = move_speed;
    }

    // -------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------

    /// Look up a body.
    pub fn body(&self, id: ObjectId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Look up a body, failing with [`WorldError::ObjectNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ObjectNotFound`] if no body has this id.
    pub fn require_body(&self, id: ObjectId) -> Result<&Body, WorldError> {
        self.body(id).ok_or(WorldError::ObjectNotFound(id))
    }

    /// All bodies in enumeration order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Look up a zone.
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// Whether the agent was inside the zone at the last step.
    pub fn agent_in_zone(&self, id: ZoneId) -> bool {
        self.zones.is_occupied(id)
    }

    /// Half size of the arena square.
    pub const fn arena_half_extent(&self) -> f64 {
        self.arena_half_extent
    }

    /// Current autonomous destination, if any.
    pub const fn destination(&self) -> Option<Vec3> {
        self.agent.destination
    }

    /// Current facing in degrees.
    pub const fn agent_yaw(&self) -> f64 {
        self.agent.yaw_degrees
    }

    /// Whether `point` lies on the arena square.
    pub fn is_navigable(&self, point: Vec3) -> bool {
        point.x.abs() <= self.arena_half_extent && point.z.abs() <= self.arena_half_extent
    }

    // -------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------

    /// Advance the world by `dt` seconds and report zone crossings.
    pub fn step(&mut self, dt: f64) -> Vec<ZoneEvent> {
        self.advance_agent(dt);
        for body in self.bodies.iter_mut().filter(|b| !b.kinematic) {
            body.position.y = body.rest_height;
        }
        let events = self.zones.update(self.agent.position);
        for event in &events {
            debug!(zone = %event.zone, kind = ?event.kind, transition = ?event.transition, "zone crossing");
        }
        events
    }

    fn advance_agent(&mut self, dt: f64) {
        let agent = &mut self.agent;
        agent.velocity = 0.0;
        if !agent.autonomy || dt <= 0.0 {
            return;
        }
        let Some(destination) = agent.destination else {
            return;
        };
        let target = destination.with_y(agent.position.y);
        let before = agent.position;
        agent.position = before.move_towards(target, agent.move_speed * dt);
        let travelled = agent.position - before;
        if let Some(direction) = travelled.normalized() {
            agent.yaw_degrees = direction.yaw_degrees();
        }
        agent.velocity = travelled.length() / dt;
    }

    fn body_mut(&mut self, id: ObjectId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }
}

/// Entry distance of a ray into a sphere, or `None` on a miss.
///
/// A ray starting inside the sphere hits at distance zero.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = radius.mul_add(-radius, oc.dot(oc));
    let disc = b.mul_add(b, -c);
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let far = -b + root;
    if far < 0.0 {
        return None;
    }
    Some((-b - root).max(0.0))
}

impl MotionProxy for SandboxWorld {
    fn set_destination(&mut self, point: Vec3) {
        self.agent.destination = Some(point);
    }

    fn stop(&mut self) {
        self.agent.destination = None;
        self.agent.velocity = 0.0;
    }

    fn arrived(&self) -> bool {
        self.agent.destination.is_none_or(|d| {
            self.agent.position.horizontal_distance(d) <= self.agent.arrive_threshold
        })
    }

    fn is_on_navigable_surface(&self) -> bool {
        self.is_navigable(self.agent.position)
    }

    fn velocity_magnitude(&self) -> f64 {
        if self.agent.autonomy {
            self.agent.velocity
        } else {
            0.0
        }
    }

    fn set_autonomy(&mut self, enabled: bool) {
        self.agent.autonomy = enabled;
        if !enabled {
            self.agent.velocity = 0.0;
        }
    }

    fn autonomy_enabled(&self) -> bool {
        self.agent.autonomy
    }

    fn position(&self) -> Vec3 {
        self.agent.position
    }

    fn forward(&self) -> Vec3 {
        Vec3::forward_from_yaw(self.agent.yaw_degrees)
    }

    fn manual_drive(&mut self, distance: f64, yaw_degrees: f64) {
        let forward = self.forward();
        self.agent.position = self.agent.position + forward * distance;
        self.agent.yaw_degrees += yaw_degrees;
    }

    fn snap_to_navigable(&mut self, max_distance: f64) -> Option<Vec3> {
        let here = self.agent.position;
        if self.is_navigable(here) {
            return None;
        }
        let h = self.arena_half_extent;
        let nearest = Vec3::new(here.x.clamp(-h, h), here.y, here.z.clamp(-h, h));
        if here.horizontal_distance(nearest) > max_distance {
            return None;
        }
        self.agent.position = nearest;
        Some(nearest)
    }
}

impl WorldQuery for SandboxWorld {
    fn find_candidates(&self, tag: Tag) -> Vec<ObjectId> {
        self.bodies
            .iter()
            .filter(|b| b.tag == tag)
            .map(|b| b.id)
            .collect()
    }

    fn object_position(&self, id: ObjectId) -> Option<Vec3> {
        self.body(id).map(|b| b.position)
    }

    fn proximity_query(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f64,
        layers: LayerMask,
    ) -> Option<ObjectId> {
        let direction = direction.normalized()?;
        let mut best: Option<(ObjectId, f64)> = None;
        for body in &self.bodies {
            if !layers.intersects(LayerMask(body.layer)) {
                continue;
            }
            let Some(t) = ray_sphere(origin, direction, body.position, body.radius) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if best.is_none_or(|(_, best_t)| t < best_t) {
                best = Some((body.id, t));
            }
        }
        best.map(|(id, _)| id)
    }

    fn overlap_query(&self, center: Vec3, half_extents: Vec3, tag: Tag) -> Vec<ObjectId> {
        self.bodies
            .iter()
            .filter(|b| b.tag == tag && b.position.within_box(center, half_extents))
            .map(|b| b.id)
            .collect()
    }

    fn set_kinematic(&mut self, id: ObjectId, kinematic: bool) -> bool {
        self.body_mut(id).is_some_and(|b| {
            b.kinematic = kinematic;
            true
        })
    }

    fn set_object_position(&mut self, id: ObjectId, position: Vec3) -> bool {
        self.body_mut(id).is_some_and(|b| {
            b.position = position;
            true
        })
    }

    fn find_zone(&self, kind: ZoneKind) -> Option<ZoneId> {
        self.zones.first_of(kind).map(|z| z.id)
    }

    fn zone_position(&self, id: ZoneId) -> Option<Vec3> {
        self.zones.get(id).map(|z| z.center)
    }
}
