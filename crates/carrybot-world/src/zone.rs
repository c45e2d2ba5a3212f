//! Trigger volumes and enter/exit tracking.
//!
//! A [`ZoneSet`] remembers which volumes currently contain the agent and
//! turns each position update into [`ZoneEvent`]s for the crossings.

use std::collections::BTreeSet;

use carrybot_types::{Vec3, ZoneEvent, ZoneId, ZoneKind, ZoneTransition};
use serde::{Deserialize, Serialize};

/// An axis-aligned trigger volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identity.
    pub id: ZoneId,
    /// What the zone is for.
    pub kind: ZoneKind,
    /// Center of the volume.
    pub center: Vec3,
    /// Half size along each axis.
    pub half_extents: Vec3,
}

impl Zone {
    /// Whether `point` lies inside the volume.
    pub fn contains(&self, point: Vec3) -> bool {
        point.within_box(self.center, self.half_extents)
    }
}

/// All trigger volumes of a world plus the set the agent is inside.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
    occupied: BTreeSet<ZoneId>,
}

impl ZoneSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            zones: Vec::new(),
            occupied: BTreeSet::new(),
        }
    }

    /// Add a volume and return its id.
    pub fn add(&mut self, kind: ZoneKind, center: Vec3, half_extents: Vec3) -> ZoneId {
        let id = ZoneId::new();
        self.zones.push(Zone {
            id,
            kind,
            center,
            half_extents,
        });
        id
    }

    /// Look up a volume.
    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// First volume of the given kind, in insertion order.
    pub fn first_of(&self, kind: ZoneKind) -> Option<&Zone> {
        self.zones.iter().find(|z| z.kind == kind)
    }

    /// Whether the agent was inside `id` at the last update.
    pub fn is_occupied(&self, id: ZoneId) -> bool {
        self.occupied.contains(&id)
    }

    /// Iterate over all volumes.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Recompute occupancy for `point` and report crossings.
    ///
    /// Exits are reported before entries so a move between two touching
    /// volumes reads as leave-then-arrive.
    pub fn update(&mut self, point: Vec3) -> Vec<ZoneEvent> {
        let mut exits = Vec::new();
        let mut entries = Vec::new();
        for zone in &self.zones {
            let inside = zone.contains(point);
            let was_inside = self.occupied.contains(&zone.id);
            if inside && !was_inside {
                entries.push(ZoneEvent {
                    zone: zone.id,
                    kind: zone.kind,
                    transition: ZoneTransition::Enter,
                });
            } else if !inside && was_inside {
                exits.push(ZoneEvent {
                    zone: zone.id,
                    kind: zone.kind,
                    transition: ZoneTransition::Exit,
                });
            }
        }
        for event in &exits {
            self.occupied.remove(&event.zone);
        }
        for event in &entries {
            self.occupied.insert(event.zone);
        }
        exits.extend(entries);
        exits
    }
}
