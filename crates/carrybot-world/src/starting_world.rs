//! Seeded starting layout for the sandbox arena.
//!
//! [`LayoutConfig`] describes the arena: its size, where the charging
//! station and drop zone sit, how many pickups to scatter, and which lift
//! platforms carry a load. [`create_starting_world`] turns it into a
//! populated [`SandboxWorld`]. Pickup placement is drawn from a `StdRng`
//! seeded by the caller, so the same seed always yields the same arena.

use carrybot_types::{ObjectId, Tag, Vec3, ZoneId, ZoneKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;
use crate::sandbox::SandboxWorld;

/// Attempts per pickup before giving up on finding a free spot.
const MAX_PLACEMENT_ATTEMPTS: u32 = 64;

/// Placement of a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    /// Center of the volume.
    pub center: Vec3,
    /// Half size along each axis.
    pub half_extents: Vec3,
}

/// Placement of a lift platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformLayout {
    /// Platform position on the ground plane; `y` is ignored.
    pub position: Vec3,
    /// Height of the platform top when lowered.
    #[serde(default)]
    pub down_y: f64,
    /// Height of the platform top when raised.
    #[serde(default = "default_platform_up_y")]
    pub up_y: f64,
    /// Vertical speed in units per second.
    #[serde(default = "default_platform_speed")]
    pub speed: f64,
    /// Whether a load starts on top of the platform.
    #[serde(default = "default_true")]
    pub with_load: bool,
}

/// Arena description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Half size of the square arena.
    #[serde(default = "default_arena_half_extent")]
    pub arena_half_extent: f64,
    /// Number of pickups to scatter.
    #[serde(default = "default_pickup_count")]
    pub pickup_count: usize,
    /// Pickup sphere radius.
    #[serde(default = "default_pickup_radius")]
    pub pickup_radius: f64,
    /// Where the agent starts.
    #[serde(default)]
    pub agent_start: Vec3,
    /// Charging station volume, if the arena has one.
    #[serde(default = "default_charging_station")]
    pub charging_station: Option<ZoneLayout>,
    /// Drop zone volume, if the arena has one.
    #[serde(default = "default_drop_zone")]
    pub drop_zone: Option<ZoneLayout>,
    /// Lift platforms.
    #[serde(default)]
    pub platforms: Vec<PlatformLayout>,
}

fn default_arena_half_extent() -> f64 {
    10.0
}

fn default_pickup_count() -> usize {
    6
}

fn default_pickup_radius() -> f64 {
    0.5
}

fn default_charging_station() -> Option<ZoneLayout> {
    Some(ZoneLayout {
        center: Vec3::new(-8.0, 0.0, -8.0),
        half_extents: Vec3::new(1.5, 1.0, 1.5),
    })
}

fn default_drop_zone() -> Option<ZoneLayout> {
    Some(ZoneLayout {
        center: Vec3::new(8.0, 0.0, 8.0),
        half_extents: Vec3::new(2.0, 1.0, 2.0),
    })
}

fn default_platform_up_y() -> f64 {
    0.35
}

fn default_platform_speed() -> f64 {
    0.4
}

const fn default_true() -> bool {
    true
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            arena_half_extent: default_arena_half_extent(),
            pickup_count: default_pickup_count(),
            pickup_radius: default_pickup_radius(),
            agent_start: Vec3::ZERO,
            charging_station: default_charging_station(),
            drop_zone: default_drop_zone(),
            platforms: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Check the layout can produce a usable arena.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidLayout`] when the arena is too small for
    /// its pickups or a zone or the agent start lies outside it.
    pub fn validate(&self) -> Result<(), WorldError> {
        let h = self.arena_half_extent;
        if self.pickup_radius <= 0.0 {
            return Err(invalid("pickup radius must be positive".to_owned()));
        }
        if h.is_nan() || h <= self.pickup_radius {
            return Err(invalid(format!(
                "arena half extent {h} must exceed pickup radius {}",
                self.pickup_radius
            )));
        }
        let inside = |p: Vec3| p.x.abs() <= h && p.z.abs() <= h;
        if !inside(self.agent_start) {
            return Err(invalid("agent start lies outside the arena".to_owned()));
        }
        for (name, zone) in [
            ("charging station", self.charging_station),
            ("drop zone", self.drop_zone),
        ] {
            if zone.is_some_and(|z| !inside(z.center)) {
                return Err(invalid(format!("{name} lies outside the arena")));
            }
        }
        for platform in &self.platforms {
            if !inside(platform.position) {
                return Err(invalid("platform lies outside the arena".to_owned()));
            }
            if platform.up_y <= platform.down_y || platform.speed <= 0.0 {
                return Err(invalid(
                    "platform needs up_y above down_y and a positive speed".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> WorldError {
    WorldError::InvalidLayout { reason }
}

/// Identifiers of everything the layout created.
#[derive(Debug, Clone)]
pub struct StartingLayoutIds {
    /// Charging station zone.
    pub charging_station: Option<ZoneId>,
    /// Drop zone.
    pub drop_zone: Option<ZoneId>,
    /// Pickups in enumeration order.
    pub pickups: Vec<ObjectId>,
    /// Load on each platform, parallel to [`LayoutConfig::platforms`].
    pub platform_loads: Vec<Option<ObjectId>>,
}

/// Build the starting arena.
///
/// Pickups are scattered uniformly inside the arena, away from the zones
/// and the agent start, using a `StdRng` seeded with `seed`.
///
/// # Errors
///
/// Returns [`WorldError::InvalidLayout`] if the layout fails validation or
/// no free spot can be found for a pickup.
pub fn create_starting_world(
    layout: &LayoutConfig,
    seed: u64,
    move_speed: f64,
    arrive_threshold: f64,
) -> Result<(SandboxWorld, StartingLayoutIds), WorldError> {
    layout.validate()?;
    let mut world = SandboxWorld::new(layout.arena_half_extent, move_speed, arrive_threshold);
    world.place_agent(layout.agent_start);

    let charging_station = layout
        .charging_station
        .map(|z| world.add_zone(ZoneKind::ChargingStation, z.center, z.half_extents));
    let drop_zone = layout
        .drop_zone
        .map(|z| world.add_zone(ZoneKind::DropZone, z.center, z.half_extents));

    let mut rng = StdRng::seed_from_u64(seed);
    let radius = layout.pickup_radius;
    let span = layout.arena_half_extent - radius;
    let blocked = |p: Vec3| {
        let near_zone = [layout.charging_station, layout.drop_zone]
            .into_iter()
            .flatten()
            .any(|z| {
                (p.x - z.center.x).abs() <= z.half_extents.x + radius
                    && (p.z - z.center.z).abs() <= z.half_extents.z + radius
            });
        near_zone || p.horizontal_distance(layout.agent_start) <= radius * 2.0
    };

    let mut pickups = Vec::with_capacity(layout.pickup_count);
    for index in 0..layout.pickup_count {
        let mut placed = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Vec3::new(
                rng.random_range(-span..=span),
                radius,
                rng.random_range(-span..=span),
            );
            if !blocked(candidate) {
                placed = Some(candidate);
                break;
            }
        }
        let position = placed.ok_or_else(|| {
            invalid(format!("no free spot for pickup {index} after {MAX_PLACEMENT_ATTEMPTS} attempts"))
        })?;
        pickups.push(world.add_body(Tag::Pickup, position, radius));
    }

    let platform_loads = layout
        .platforms
        .iter()
        .map(|p| {
            p.with_load.then(|| {
                let top = p.position.with_y(p.down_y + radius);
                world.add_body(Tag::Load, top, radius)
            })
        })
        .collect();

    info!(
        seed,
        pickups = pickups.len(),
        platforms = layout.platforms.len(),
        "starting world created"
    );

    Ok((
        world,
        StartingLayoutIds {
            charging_station,
            drop_zone,
            pickups,
            platform_loads,
        },
    ))
}
